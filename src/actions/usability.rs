//! Usability predicate
//!
//! Decides whether a combatant may take an action right now. Shared by the
//! AI enumeration, the player's choice list, reactions and forced grapple
//! actions.

use std::fmt;

use crate::actions::catalog::{is_innate, Action, ActionCatalog, GRAPPLED_ALLOW_LIST, INNATE_ACTIONS};
use crate::actions::effect::Keyword;
use crate::combat::combatant::Combatant;
use crate::combat::skill::Skill;
use crate::core::types::Range;

/// Why an action was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum Unusable {
    NotInCatalog,
    RequiresGrapple,
    MissingItem(String),
    BlockedByGrapple,
    NotLearned,
    SkillTooLow { skill: Skill, required: u32, current: u32 },
    NotEnoughStamina,
    NotEnoughChakra,
    OutOfRange,
}

impl fmt::Display for Unusable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unusable::NotInCatalog => write!(f, "not a known action"),
            Unusable::RequiresGrapple => write!(f, "only usable while grappled"),
            Unusable::MissingItem(item) => write!(f, "requires {}", item),
            Unusable::BlockedByGrapple => write!(f, "not possible while grappled"),
            Unusable::NotLearned => write!(f, "technique not learned"),
            Unusable::SkillTooLow {
                skill,
                required,
                current,
            } => write!(f, "requires {:?} {} (have {})", skill, required, current),
            Unusable::NotEnoughStamina => write!(f, "not enough stamina"),
            Unusable::NotEnoughChakra => write!(f, "not enough chakra"),
            Unusable::OutOfRange => write!(f, "out of range"),
        }
    }
}

/// Check every usability rule in order, reporting the first failure
pub fn check_usable(
    combatant: &Combatant,
    action: &Action,
    range: Range,
) -> std::result::Result<(), Unusable> {
    let grappled = combatant.is_grappled();

    if action.has_keyword(Keyword::GrappleOnly) && !grappled {
        return Err(Unusable::RequiresGrapple);
    }
    if let Some(item) = &action.required_item {
        if combatant.item_count(item) < 1 {
            return Err(Unusable::MissingItem(item.clone()));
        }
    }
    if grappled && !GRAPPLED_ALLOW_LIST.contains(&action.name.as_str()) {
        return Err(Unusable::BlockedByGrapple);
    }
    if !is_innate(&action.name)
        && !action.has_keyword(Keyword::GrappleOnly)
        && combatant.technique_level(&action.name) < 1
    {
        return Err(Unusable::NotLearned);
    }
    if let Some(gate) = action.requires_skill {
        let current = combatant.skills.get(gate.skill);
        if current < gate.level {
            return Err(Unusable::SkillTooLow {
                skill: gate.skill,
                required: gate.level,
                current,
            });
        }
    }
    if combatant.vitals.stamina < action.stamina_cost {
        return Err(Unusable::NotEnoughStamina);
    }
    if combatant.vitals.chakra < action.chakra_cost {
        return Err(Unusable::NotEnoughChakra);
    }
    if !action.reach.allows(range) {
        return Err(Unusable::OutOfRange);
    }
    Ok(())
}

/// Name-based predicate; unknown names are never usable
pub fn is_usable(combatant: &Combatant, catalog: &ActionCatalog, name: &str, range: Range) -> bool {
    catalog
        .get(name)
        .is_some_and(|action| check_usable(combatant, action, range).is_ok())
}

/// Everything the combatant could choose as a turn, in a stable order
///
/// Innate abilities first (in their fixed order), then learned techniques by
/// name. Reaction-only actions are excluded.
pub fn usable_actions<'a>(
    combatant: &Combatant,
    catalog: &'a ActionCatalog,
    range: Range,
) -> Vec<&'a Action> {
    let innate = INNATE_ACTIONS.iter().copied();
    let learned = combatant
        .known_actions
        .keys()
        .map(String::as_str)
        .filter(|name| !is_innate(name));

    innate
        .chain(learned)
        .filter_map(|name| catalog.get(name))
        .filter(|action| !action.is_reaction_only())
        .filter(|action| check_usable(combatant, action, range).is_ok())
        .collect()
}
