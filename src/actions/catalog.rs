//! Action definitions and catalog

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actions::effect::{
    ActionEffect, ActionType, Category, CheckProfile, Complexity, ContestedCheck, EffectTag,
    EffectTarget, Keyword, Reach, SkillRequirement, TagTemplate,
};
use crate::combat::combatant::Attribute;
use crate::combat::skill::Skill;
use crate::combat::tags::{TagKind, UNTIL_CLEARED};
use crate::core::error::{CombatError, Result};
use crate::core::types::{Element, Range, Rank};

pub const STRIKE: &str = "Strike";
pub const HEAVY_STRIKE: &str = "Heavy Strike";
pub const KUNAI_STAB: &str = "Kunai Stab";
pub const GUARD: &str = "Guard";
pub const STRUGGLE: &str = "Struggle";
pub const ESCAPE_GRAPPLE: &str = "Attempt to Escape Grapple";
pub const ANALYZE: &str = "Analyze";
pub const DASH: &str = "Dash";
pub const SUBSTITUTION: &str = "Substitution Jutsu";
pub const DODGE: &str = "Dodge";
pub const BLOCK: &str = "Block";

/// Abilities every combatant has without learning them
pub const INNATE_ACTIONS: &[&str] = &[
    STRIKE,
    HEAVY_STRIKE,
    KUNAI_STAB,
    GUARD,
    ANALYZE,
    DASH,
    ESCAPE_GRAPPLE,
    "Leaf Whirlwind",
    "Dynamic Entry",
    "Takedown",
    "Feint",
    "Shuriken Throw",
    "Shadow Shuriken",
    "Poison Senbon",
    "Set Trap",
];

/// The only actions a grappled combatant may take
pub const GRAPPLED_ALLOW_LIST: &[&str] = &[ESCAPE_GRAPPLE, STRIKE, KUNAI_STAB];

/// Forced action preference of a grappler holding someone down
pub const GRAPPLER_PREFERENCE: &[&str] = &[KUNAI_STAB, HEAVY_STRIKE, STRIKE];

pub fn is_innate(name: &str) -> bool {
    INNATE_ACTIONS.contains(&name)
}

/// Immutable action definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub rank: Rank,
    pub kind: ActionType,
    pub category: Category,
    pub reach: Reach,
    #[serde(default)]
    pub chakra_cost: f32,
    #[serde(default)]
    pub stamina_cost: f32,
    #[serde(default)]
    pub base_power: f32,
    #[serde(default)]
    pub element: Option<Element>,
    #[serde(default)]
    pub effect_tag: EffectTag,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub effect: ActionEffect,
    #[serde(default)]
    pub required_item: Option<String>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub requires_skill: Option<SkillRequirement>,
}

impl Action {
    fn new(name: &str, rank: Rank, kind: ActionType, category: Category, reach: Reach) -> Self {
        Self {
            name: name.to_string(),
            rank,
            kind,
            category,
            reach,
            chakra_cost: 0.0,
            stamina_cost: 0.0,
            base_power: 0.0,
            element: None,
            effect_tag: EffectTag::Standard,
            complexity: Complexity::None,
            effect: ActionEffect::None,
            required_item: None,
            keywords: Vec::new(),
            requires_skill: None,
        }
    }

    fn power(mut self, base_power: f32) -> Self {
        self.base_power = base_power;
        self
    }

    fn costs(mut self, chakra: f32, stamina: f32) -> Self {
        self.chakra_cost = chakra;
        self.stamina_cost = stamina;
        self
    }

    fn element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    fn tag(mut self, effect_tag: EffectTag) -> Self {
        self.effect_tag = effect_tag;
        self
    }

    fn complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    fn effect(mut self, effect: ActionEffect) -> Self {
        self.effect = effect;
        self
    }

    fn item(mut self, item: &str) -> Self {
        self.required_item = Some(item.to_string());
        self
    }

    fn keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.push(keyword);
        self
    }

    fn gate(mut self, skill: Skill, level: u32) -> Self {
        self.requires_skill = Some(SkillRequirement { skill, level });
        self
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    pub fn is_offensive(&self) -> bool {
        self.kind == ActionType::Offensive
    }

    pub fn is_reaction_only(&self) -> bool {
        self.has_keyword(Keyword::ReactionOnly)
    }

    /// Rank B or better, flagged Powerful, or raw power above 30
    pub fn is_finisher(&self) -> bool {
        self.rank >= Rank::B || self.has_keyword(Keyword::Powerful) || self.base_power > 30.0
    }

    /// Close-quarters offense that works at Engaged range
    pub fn is_melee(&self) -> bool {
        self.is_offensive()
            && matches!(self.category, Category::Taijutsu | Category::Tool)
            && self.reach.allows(Range::Engaged)
    }

    /// Deception-shaped or flagged Deceptive
    pub fn is_deceptive(&self) -> bool {
        self.effect_tag == EffectTag::Deception || self.has_keyword(Keyword::Deceptive)
    }

    /// Creates distance: evasion shapes and pushes
    pub fn is_evasive_or_push(&self) -> bool {
        match self.effect_tag {
            EffectTag::Evasion | EffectTag::Push => true,
            _ => matches!(self.effect, ActionEffect::ChangeRange { to } if to > Range::Short),
        }
    }

    /// Aimed at an opponent rather than at the user
    pub fn is_target_directed(&self) -> bool {
        !self.reach.is_personal()
    }

    /// Supplementary technique that does something to its target
    pub fn is_hostile_supplementary(&self) -> bool {
        self.kind == ActionType::Supplementary
            && self.is_target_directed()
            && (self.effect.targets_opponent()
                || matches!(self.effect_tag, EffectTag::Grapple | EffectTag::Deception))
    }

    /// Does this action move the shared range?
    pub fn range_target(&self) -> Option<Range> {
        self.effect.range_target()
    }

    /// Definition-level validation
    pub fn validate(&self) -> Result<()> {
        if let Reach::Ranges(ranges) = &self.reach {
            if ranges.is_empty() {
                return Err(CombatError::InvalidAction(format!(
                    "{} has no valid ranges and is not Personal",
                    self.name
                )));
            }
        }
        if self.chakra_cost < 0.0 || self.stamina_cost < 0.0 || self.base_power < 0.0 {
            return Err(CombatError::InvalidAction(format!(
                "{} has a negative cost or power",
                self.name
            )));
        }
        Ok(())
    }
}

/// Static lookup of action definitions keyed by name
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    actions: BTreeMap<String, Action>,
    guard: Action,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    actions: Vec<Action>,
}

impl ActionCatalog {
    /// Build a catalog from definitions; Guard, Struggle and the grapple
    /// escape are always present afterwards
    pub fn from_actions(actions: impl IntoIterator<Item = Action>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for action in actions {
            action.validate()?;
            map.insert(action.name.clone(), action);
        }
        for fallback in [guard(), struggle(), escape_grapple()] {
            map.entry(fallback.name.clone()).or_insert(fallback);
        }
        let guard = map.get(GUARD).cloned().unwrap_or_else(guard);
        Ok(Self { actions: map, guard })
    }

    /// Parse a catalog from TOML (`[[actions]]` tables)
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;
        Self::from_actions(file.actions)
    }

    /// Load a catalog from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Built-in technique table
    pub fn standard() -> Self {
        Self {
            actions: standard_actions()
                .into_iter()
                .map(|a| (a.name.clone(), a))
                .collect(),
            guard: guard(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Look up an action, falling back to Guard for unknown names
    pub fn get_or_guard(&self, name: &str) -> &Action {
        match self.actions.get(name) {
            Some(action) => action,
            None => {
                tracing::warn!("Unknown action {:?}; falling back to Guard", name);
                &self.guard
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn all_ranges() -> Reach {
    Reach::Ranges(vec![Range::Engaged, Range::Short, Range::Mid, Range::Long])
}

fn melee() -> Reach {
    Reach::Ranges(vec![Range::Engaged])
}

fn check(attacker: (Attribute, Option<Skill>), defender: (Attribute, Option<Skill>)) -> ContestedCheck {
    ContestedCheck {
        attacker: CheckProfile {
            attribute: attacker.0,
            skill: attacker.1,
        },
        defender: CheckProfile {
            attribute: defender.0,
            skill: defender.1,
        },
    }
}

fn template(kind: TagKind, duration: i32, payload: Option<f32>) -> TagTemplate {
    TagTemplate {
        kind,
        duration,
        payload,
    }
}

fn guard() -> Action {
    Action::new(GUARD, Rank::E, ActionType::Defensive, Category::Tactical, Reach::Personal)
        .tag(EffectTag::Guard)
}

fn struggle() -> Action {
    Action::new(STRUGGLE, Rank::E, ActionType::Offensive, Category::Innate, all_ranges())
        .power(5.0)
        .tag(EffectTag::Struggle)
}

fn escape_grapple() -> Action {
    Action::new(ESCAPE_GRAPPLE, Rank::E, ActionType::Supplementary, Category::Taijutsu, melee())
        .costs(0.0, 8.0)
        .tag(EffectTag::Escape)
        .keyword(Keyword::GrappleOnly)
}

fn standard_actions() -> Vec<Action> {
    use ActionType::*;
    use Attribute::*;
    use Category::*;

    vec![
        guard(),
        struggle(),
        escape_grapple(),
        // --- innate taijutsu and tools ---
        Action::new(STRIKE, Rank::E, Offensive, Taijutsu, melee()).power(12.0).costs(0.0, 5.0),
        Action::new(HEAVY_STRIKE, Rank::D, Offensive, Taijutsu, melee())
            .power(22.0)
            .costs(0.0, 12.0)
            .keyword(Keyword::Powerful)
            .gate(Skill::Taijutsu, 10),
        Action::new(KUNAI_STAB, Rank::D, Offensive, Tool, melee())
            .power(18.0)
            .costs(0.0, 6.0)
            .item("Kunai"),
        Action::new("Leaf Whirlwind", Rank::C, Offensive, Taijutsu, melee())
            .power(20.0)
            .costs(0.0, 10.0)
            .tag(EffectTag::StanceBreak)
            .gate(Skill::Taijutsu, 5)
            .effect(ActionEffect::Contested {
                check: check((Strength, Some(Skill::Taijutsu)), (Agility, Some(Skill::Taijutsu))),
                tag: template(TagKind::Airborne, 1, None),
                on: EffectTarget::Target,
            }),
        Action::new(
            "Dynamic Entry",
            Rank::C,
            Offensive,
            Taijutsu,
            Reach::Ranges(vec![Range::Short, Range::Mid]),
        )
        .power(26.0)
        .costs(0.0, 15.0)
        .keyword(Keyword::Powerful)
        .gate(Skill::Taijutsu, 15)
        .effect(ActionEffect::ChangeRange { to: Range::Engaged }),
        Action::new("Takedown", Rank::C, Offensive, Taijutsu, melee())
            .power(10.0)
            .costs(0.0, 14.0)
            .tag(EffectTag::Grapple)
            .gate(Skill::Taijutsu, 8),
        Action::new("Feint", Rank::D, Offensive, Taijutsu, melee())
            .power(14.0)
            .costs(0.0, 6.0)
            .tag(EffectTag::Deception)
            .keyword(Keyword::Deceptive),
        Action::new(
            "Shuriken Throw",
            Rank::E,
            Offensive,
            Tool,
            Reach::Ranges(vec![Range::Short, Range::Mid, Range::Long]),
        )
        .power(10.0)
        .costs(0.0, 4.0)
        .tag(EffectTag::Projectile)
        .keyword(Keyword::Fast)
        .item("Shuriken"),
        Action::new(
            "Shadow Shuriken",
            Rank::C,
            Offensive,
            Tool,
            Reach::Ranges(vec![Range::Mid, Range::Long]),
        )
        .power(24.0)
        .costs(0.0, 8.0)
        .tag(EffectTag::Projectile)
        .keyword(Keyword::Deceptive)
        .keyword(Keyword::Guided)
        .item("Shuriken")
        .gate(Skill::Shurikenjutsu, 20),
        Action::new(
            "Poison Senbon",
            Rank::D,
            Offensive,
            Tool,
            Reach::Ranges(vec![Range::Short, Range::Mid]),
        )
        .power(8.0)
        .costs(0.0, 4.0)
        .tag(EffectTag::Projectile)
        .keyword(Keyword::Fast)
        .item("Senbon")
        .effect(ActionEffect::Contested {
            check: check((Agility, Some(Skill::Shurikenjutsu)), (Perception, None)),
            tag: template(TagKind::Poisoned, 4, Some(3.0)),
            on: EffectTarget::Target,
        }),
        Action::new("Set Trap", Rank::D, Supplementary, Tool, Reach::Personal)
            .costs(0.0, 6.0)
            .tag(EffectTag::Trap)
            .item("Wire")
            .effect(ActionEffect::ApplyTag {
                tag: template(TagKind::TrapReady, 8, Some(25.0)),
                on: EffectTarget::User,
            }),
        Action::new(ANALYZE, Rank::E, Supplementary, Tactical, all_ranges()).tag(EffectTag::Analysis),
        Action::new(
            DASH,
            Rank::E,
            Supplementary,
            Tactical,
            Reach::Ranges(vec![Range::Short, Range::Mid, Range::Long]),
        )
        .costs(0.0, 8.0)
        .effect(ActionEffect::ChangeRange { to: Range::Engaged }),
        // --- reactions ---
        Action::new(DODGE, Rank::E, Defensive, Taijutsu, Reach::Personal)
            .costs(0.0, 6.0)
            .tag(EffectTag::Evasion)
            .keyword(Keyword::ReactionOnly),
        Action::new(BLOCK, Rank::E, Defensive, Taijutsu, Reach::Personal)
            .costs(0.0, 5.0)
            .tag(EffectTag::Barrier)
            .keyword(Keyword::ReactionOnly),
        Action::new(SUBSTITUTION, Rank::D, Defensive, Ninjutsu, Reach::Personal)
            .costs(10.0, 0.0)
            .tag(EffectTag::Substitution)
            .keyword(Keyword::ReactionOnly),
        // --- learned ninjutsu ---
        Action::new("Clone Jutsu", Rank::E, Supplementary, Ninjutsu, Reach::Personal)
            .costs(8.0, 0.0)
            .tag(EffectTag::Clone)
            .complexity(Complexity::Simple)
            .effect(ActionEffect::ApplyTag {
                tag: template(TagKind::CloneDecoy, 6, None),
                on: EffectTarget::User,
            }),
        Action::new("Shadow Clone Jutsu", Rank::B, Supplementary, Ninjutsu, Reach::Personal)
            .costs(25.0, 0.0)
            .tag(EffectTag::Clone)
            .complexity(Complexity::Moderate)
            .effect(ActionEffect::ApplyTag {
                tag: template(TagKind::CloneDecoy, 10, None),
                on: EffectTarget::User,
            }),
        Action::new("Transformation Jutsu", Rank::E, Supplementary, Ninjutsu, Reach::Personal)
            .costs(6.0, 0.0)
            .tag(EffectTag::Transformation)
            .keyword(Keyword::Deceptive)
            .complexity(Complexity::Simple)
            .effect(ActionEffect::Contested {
                check: check((Intellect, Some(Skill::Ninjutsu)), (Perception, None)),
                tag: template(TagKind::Disguised, UNTIL_CLEARED, None),
                on: EffectTarget::User,
            }),
        Action::new("Body Flicker", Rank::D, Supplementary, Ninjutsu, Reach::Personal)
            .costs(8.0, 2.0)
            .tag(EffectTag::Evasion)
            .effect(ActionEffect::ChangeRange { to: Range::Long }),
        Action::new("Hidden Mist Jutsu", Rank::C, Supplementary, Ninjutsu, Reach::Personal)
            .costs(15.0, 0.0)
            .element(Element::Water)
            .complexity(Complexity::Simple)
            .effect(ActionEffect::ApplyTag {
                tag: template(TagKind::MistCover, 6, None),
                on: EffectTarget::Battlefield,
            }),
        Action::new(
            "Fireball Jutsu",
            Rank::C,
            Offensive,
            Ninjutsu,
            Reach::Ranges(vec![Range::Short, Range::Mid, Range::Long]),
        )
        .power(30.0)
        .costs(18.0, 0.0)
        .element(Element::Fire)
        .tag(EffectTag::Projectile)
        .complexity(Complexity::Moderate)
        .effect(ActionEffect::Contested {
            check: check((Intellect, Some(Skill::Ninjutsu)), (Agility, None)),
            tag: template(TagKind::Burning, 3, Some(4.0)),
            on: EffectTarget::Target,
        }),
        Action::new(
            "Great Fire Annihilation",
            Rank::B,
            Offensive,
            Ninjutsu,
            Reach::Ranges(vec![Range::Mid, Range::Long]),
        )
        .power(42.0)
        .costs(32.0, 0.0)
        .element(Element::Fire)
        .tag(EffectTag::AoE)
        .complexity(Complexity::Complex)
        .keyword(Keyword::Powerful),
        Action::new(
            "Great Breakthrough",
            Rank::C,
            Offensive,
            Ninjutsu,
            Reach::Ranges(vec![Range::Engaged, Range::Short, Range::Mid]),
        )
        .power(18.0)
        .costs(14.0, 0.0)
        .element(Element::Wind)
        .tag(EffectTag::LineAoE)
        .complexity(Complexity::Simple)
        .effect(ActionEffect::ChangeRange { to: Range::Mid }),
        Action::new(
            "Water Bullet",
            Rank::C,
            Offensive,
            Ninjutsu,
            Reach::Ranges(vec![Range::Short, Range::Mid]),
        )
        .power(24.0)
        .costs(16.0, 0.0)
        .element(Element::Water)
        .tag(EffectTag::MultiProjectile)
        .complexity(Complexity::Simple),
        Action::new(
            "Earth Spikes",
            Rank::C,
            Offensive,
            Ninjutsu,
            Reach::Ranges(vec![Range::Engaged, Range::Short, Range::Mid]),
        )
        .power(26.0)
        .costs(16.0, 0.0)
        .element(Element::Earth)
        .tag(EffectTag::AoE)
        .complexity(Complexity::Simple),
        Action::new(
            "Chidori",
            Rank::A,
            Offensive,
            Ninjutsu,
            Reach::Ranges(vec![Range::Engaged, Range::Short]),
        )
        .power(55.0)
        .costs(35.0, 5.0)
        .element(Element::Lightning)
        .complexity(Complexity::Complex)
        .keyword(Keyword::Powerful),
        Action::new("Rasengan", Rank::A, Offensive, Ninjutsu, melee())
            .power(50.0)
            .costs(30.0, 0.0)
            .complexity(Complexity::Complex)
            .keyword(Keyword::Powerful),
        // --- elemental walls ---
        Action::new("Water Wall", Rank::C, Defensive, Ninjutsu, Reach::Personal)
            .power(20.0)
            .costs(15.0, 0.0)
            .element(Element::Water)
            .tag(EffectTag::Barrier),
        Action::new("Earth Wall", Rank::C, Defensive, Ninjutsu, Reach::Personal)
            .power(24.0)
            .costs(16.0, 0.0)
            .element(Element::Earth)
            .tag(EffectTag::Barrier),
        Action::new("Flame Wall", Rank::C, Defensive, Ninjutsu, Reach::Personal)
            .power(20.0)
            .costs(15.0, 0.0)
            .element(Element::Fire)
            .tag(EffectTag::Barrier),
        Action::new("Wind Shield", Rank::C, Defensive, Ninjutsu, Reach::Personal)
            .power(18.0)
            .costs(14.0, 0.0)
            .element(Element::Wind)
            .tag(EffectTag::Barrier),
        Action::new("Lightning Veil", Rank::C, Defensive, Ninjutsu, Reach::Personal)
            .power(18.0)
            .costs(14.0, 0.0)
            .element(Element::Lightning)
            .tag(EffectTag::Barrier),
        // --- genjutsu ---
        Action::new(
            "Demonic Illusion",
            Rank::C,
            Supplementary,
            Genjutsu,
            Reach::Ranges(vec![Range::Short, Range::Mid, Range::Long]),
        )
        .costs(15.0, 0.0)
        .tag(EffectTag::Deception)
        .complexity(Complexity::Simple)
        .effect(ActionEffect::Contested {
            check: check((Intellect, Some(Skill::Genjutsu)), (Intellect, Some(Skill::Genjutsu))),
            tag: template(TagKind::Dazed, 3, None),
            on: EffectTarget::Target,
        }),
        Action::new(
            "Binding Illusion",
            Rank::B,
            Supplementary,
            Genjutsu,
            Reach::Ranges(vec![Range::Short, Range::Mid]),
        )
        .costs(24.0, 0.0)
        .tag(EffectTag::Deception)
        .complexity(Complexity::Moderate)
        .effect(ActionEffect::Contested {
            check: check((Intellect, Some(Skill::Genjutsu)), (Intellect, Some(Skill::Genjutsu))),
            tag: template(TagKind::Slowed, 4, None),
            on: EffectTarget::Target,
        }),
        Action::new("Counter Stance", Rank::D, Counter, Taijutsu, Reach::Personal)
            .costs(0.0, 6.0)
            .effect(ActionEffect::Reposition {
                chance: 0.5,
                to: Range::Engaged,
            }),
    ]
}
