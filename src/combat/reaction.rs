//! Defensive reactions
//!
//! Before an incoming action resolves, the defender gets one chance to
//! respond. Checks run in a fixed order and the first one that triggers
//! wins:
//! 1. elemental wall against elemental ranged ninjutsu
//! 2. substitution against threatening actions
//! 3. dodge or block against taijutsu at Engaged range
//! 4. an armed trap against a Dash
//!
//! A casting or Dazed defender skips the first three, but an armed trap
//! still fires. The procedure is the same for AI and player defenders.

use crate::actions::catalog::{Action, BLOCK, DASH, DODGE, GUARD, SUBSTITUTION};
use crate::actions::effect::{ActionType, Category, CheckProfile};
use crate::actions::usability::check_usable;
use crate::combat::combatant::{Attribute, Combatant};
use crate::combat::context::TurnContext;
use crate::combat::events::{CombatEventKind, Severity};
use crate::combat::posture::{transition, PostureTrigger};
use crate::combat::skill::Skill;
use crate::combat::tags::TagKind;
use crate::core::types::{Range, Rank};

/// Chance to raise an elementally advantageous wall
pub const ADVANTAGE_WALL_CHANCE: f32 = 0.95;
/// Chance to raise any other affordable wall
pub const FALLBACK_WALL_CHANCE: f32 = 0.5;
/// Chakra margin required for a non-advantageous wall
pub const FALLBACK_WALL_MARGIN: f32 = 1.5;

/// What the defender did about an incoming action
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Nothing; the action proceeds unopposed
    None,
    /// A defensive technique intercepted the action
    Wall {
        name: String,
        advantageous: bool,
        /// Power soaked up when not advantageous
        absorb: f32,
    },
    Substitution,
    Dodge { success: bool },
    Block { success: bool },
    /// Trap fired on the attacker
    TrapSprung { damage: f32 },
}

impl Reaction {
    /// Does the incoming action land at all?
    pub fn negates(&self) -> bool {
        match self {
            Reaction::None => false,
            Reaction::Wall { advantageous, .. } => *advantageous,
            Reaction::Substitution | Reaction::TrapSprung { .. } => true,
            Reaction::Dodge { success } | Reaction::Block { success } => *success,
        }
    }
}

/// Base substitution chance by incoming rank
pub fn substitution_chance(rank: Rank) -> f32 {
    match rank {
        Rank::E => 0.10,
        Rank::D => 0.15,
        Rank::C => 0.30,
        Rank::B => 0.50,
        Rank::A => 0.75,
        Rank::S => 1.0,
    }
}

/// Linear scale from zero at 20% chakra to full at 80%
pub fn chakra_scale(chakra_fraction: f32) -> f32 {
    ((chakra_fraction - 0.2) / 0.6).clamp(0.0, 1.0)
}

fn is_threatening(action: &Action) -> bool {
    action.base_power >= 20.0 || action.rank >= Rank::D
}

const TAIJUTSU_AGILITY: CheckProfile = CheckProfile {
    attribute: Attribute::Agility,
    skill: Some(Skill::Taijutsu),
};

const TAIJUTSU_STRENGTH: CheckProfile = CheckProfile {
    attribute: Attribute::Strength,
    skill: Some(Skill::Taijutsu),
};

pub fn dodge_chance(attacker: &Combatant, defender: &Combatant, action: &Action) -> f32 {
    let diff = defender.attributes.agility - attacker.attributes.agility;
    let mut chance = 0.15 + 0.02 * diff;
    if let Some(profile) = defender.ai_profile {
        chance += profile.weights().dodge_bonus;
    }
    if action.is_deceptive() {
        chance *= 0.5;
    }
    chance.clamp(0.0, 0.95)
}

pub fn block_chance(attacker: &Combatant, defender: &Combatant, action: &Action) -> f32 {
    let diff = defender.attributes.strength - attacker.attributes.strength;
    let mut chance = 0.20 + 0.015 * diff;
    if let Some(profile) = defender.ai_profile {
        chance += profile.weights().block_bonus;
    }
    if action.is_deceptive() {
        chance *= 0.5;
    }
    chance.clamp(0.0, 0.95)
}

/// Can this defender choose a reaction right now? Armed traps ignore this.
fn can_react(defender: &Combatant) -> bool {
    !defender.is_casting() && !defender.has_tag(TagKind::Dazed)
}

/// Give the defender its chance to respond to `action`
pub fn react(ctx: &mut TurnContext<'_>, attacker: usize, defender: usize, action: &Action) -> Reaction {
    let range = ctx.state.range();
    let Some(def) = ctx.state.combatants.get(defender) else {
        return Reaction::None;
    };
    if !def.is_alive() {
        return Reaction::None;
    }

    if can_react(def) {
        if let Some(reaction) = try_wall(ctx, defender, action) {
            return reaction;
        }
        if let Some(reaction) = try_substitution(ctx, defender, action) {
            return reaction;
        }
        if action.category == Category::Taijutsu && range == Range::Engaged {
            if let Some(reaction) = try_dodge_or_block(ctx, attacker, defender, action) {
                return reaction;
            }
        }
    }
    if action.name == DASH {
        if let Some(reaction) = spring_trap(ctx, attacker, defender) {
            return reaction;
        }
    }
    Reaction::None
}

fn try_wall(ctx: &mut TurnContext<'_>, defender: usize, action: &Action) -> Option<Reaction> {
    let incoming = action.element?;
    if !action.effect_tag.is_ranged_jutsu() {
        return None;
    }
    let catalog = ctx.catalog;
    let range = ctx.state.range();
    let def = &ctx.state.combatants[defender];

    let walls: Vec<&Action> = def
        .known_actions
        .keys()
        .filter_map(|name| catalog.get(name))
        .filter(|a| a.kind == ActionType::Defensive && a.name != GUARD && !a.is_reaction_only())
        .filter(|a| check_usable(def, a, range).is_ok())
        .collect();
    if walls.is_empty() {
        return None;
    }

    let counter = incoming.countered_by();
    let advantageous = walls.iter().copied().find(|w| w.element == Some(counter));

    let chosen = match advantageous {
        Some(wall) if ctx.rng.chance(ADVANTAGE_WALL_CHANCE) => Some((wall, true)),
        _ => {
            let chakra = def.vitals.chakra;
            let safe: Vec<&Action> = walls
                .iter()
                .copied()
                .filter(|w| chakra >= w.chakra_cost * FALLBACK_WALL_MARGIN)
                .collect();
            if !safe.is_empty() && ctx.rng.chance(FALLBACK_WALL_CHANCE) {
                let wall = safe[ctx.rng.index(safe.len())];
                Some((wall, wall.element == Some(counter)))
            } else {
                None
            }
        }
    }?;

    let (wall, advantageous) = chosen;
    let def = &mut ctx.state.combatants[defender];
    def.vitals.spend_chakra(wall.chakra_cost);
    def.vitals.spend_stamina(wall.stamina_cost);
    let id = def.id;
    let message = if advantageous {
        format!("{} raises {} and smothers the {}", def.name, wall.name, action.name)
    } else {
        format!("{} raises {} against the {}", def.name, wall.name, action.name)
    };
    ctx.emit(
        CombatEventKind::Reaction {
            defender: id,
            reaction: wall.name.clone(),
            success: advantageous,
        },
        message,
        Severity::Info,
    );
    Some(Reaction::Wall {
        name: wall.name.clone(),
        advantageous,
        absorb: wall.base_power,
    })
}

fn try_substitution(ctx: &mut TurnContext<'_>, defender: usize, action: &Action) -> Option<Reaction> {
    if !is_threatening(action) {
        return None;
    }
    let catalog = ctx.catalog;
    let substitution = catalog.get(SUBSTITUTION)?;
    let def = &ctx.state.combatants[defender];
    if def.technique_level(SUBSTITUTION) < 1 || def.vitals.chakra < substitution.chakra_cost {
        return None;
    }
    let chance = substitution_chance(action.rank) * chakra_scale(def.vitals.chakra_fraction());
    if !ctx.rng.chance(chance) {
        return None;
    }

    let def = &mut ctx.state.combatants[defender];
    def.vitals.spend_chakra(substitution.chakra_cost);
    let id = def.id;
    let message = format!("{} swaps places with a log!", def.name);
    ctx.emit(
        CombatEventKind::Reaction {
            defender: id,
            reaction: SUBSTITUTION.to_string(),
            success: true,
        },
        message,
        Severity::Miss,
    );
    Some(Reaction::Substitution)
}

fn try_dodge_or_block(
    ctx: &mut TurnContext<'_>,
    attacker: usize,
    defender: usize,
    action: &Action,
) -> Option<Reaction> {
    let catalog = ctx.catalog;
    let (atk, def) = (&ctx.state.combatants[attacker], &ctx.state.combatants[defender]);
    if def.is_grappled() {
        return None;
    }

    let dodge = catalog.get(DODGE);
    let block = catalog.get(BLOCK);
    let can_dodge = dodge.is_some_and(|d| def.vitals.stamina >= d.stamina_cost);
    let can_block = block.is_some_and(|b| def.vitals.stamina >= b.stamina_cost);
    let dodge_p = dodge_chance(atk, def, action);
    let block_p = block_chance(atk, def, action);

    if let (true, Some(dodge)) = (can_dodge, dodge) {
        if ctx.rng.chance(dodge_p) {
            let success = contest(ctx, attacker, defender, &TAIJUTSU_AGILITY, dodge.stamina_cost);
            return Some(Reaction::Dodge { success });
        }
    }
    if let (true, Some(block)) = (can_block, block) {
        if ctx.rng.chance(block_p) {
            let success = contest(ctx, attacker, defender, &TAIJUTSU_STRENGTH, block.stamina_cost);
            return Some(Reaction::Block { success });
        }
    }
    None
}

/// Spend the reaction's stamina and run the contest, narrating the result
fn contest(
    ctx: &mut TurnContext<'_>,
    attacker: usize,
    defender: usize,
    profile: &CheckProfile,
    stamina_cost: f32,
) -> bool {
    ctx.state.combatants[defender].vitals.spend_stamina(stamina_cost);
    let attack = ctx.state.combatants[attacker].check_value(profile);
    let defend = ctx.state.combatants[defender].check_value(profile) * ctx.rng.fuzz();
    let success = defend >= attack;

    let dodging = profile.attribute == Attribute::Agility;
    let (reaction, verb) = if dodging { (DODGE, "dodge") } else { (BLOCK, "block") };
    let def = &ctx.state.combatants[defender];
    let id = def.id;
    let message = if success {
        format!("{} manages to {} the blow", def.name, verb)
    } else {
        format!("{} tries to {} but is too slow", def.name, verb)
    };
    ctx.emit(
        CombatEventKind::Reaction {
            defender: id,
            reaction: reaction.to_string(),
            success,
        },
        message,
        if success { Severity::Miss } else { Severity::Info },
    );
    success
}

fn spring_trap(ctx: &mut TurnContext<'_>, attacker: usize, defender: usize) -> Option<Reaction> {
    let trap = ctx.state.combatants[defender].tags.remove(TagKind::TrapReady)?;
    let power = trap.payload.unwrap_or(0.0).max(0.0);

    let atk = &mut ctx.state.combatants[attacker];
    let dealt = atk.vitals.take_damage(power.round());
    atk.posture = transition(atk.posture, PostureTrigger::CaughtOut);
    let victim = atk.id;
    let victim_name = atk.name.clone();
    let owner = ctx.state.combatants[defender].id;

    ctx.emit(
        CombatEventKind::TrapSprung {
            owner,
            victim,
            damage: dealt,
        },
        format!("{} dashes straight into a wire trap for {} damage!", victim_name, dealt),
        Severity::Critical,
    );
    Some(Reaction::TrapSprung { damage: dealt })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::catalog::{ActionCatalog, STRIKE};
    use crate::ai::profile::AiProfile;
    use crate::combat::combatant::CastingState;
    use crate::combat::host::RecordHost;
    use crate::combat::state::CombatState;
    use crate::combat::tags::Tag;
    use crate::core::config::CombatConfig;
    use crate::core::rng::SequenceRng;
    use crate::core::types::CombatantId;
    use crate::records::CharacterRecord;

    fn duel(range: Range) -> CombatState {
        let player = Combatant::new(CombatantId::PLAYER, "Hero", true);
        let foe = Combatant::new(CombatantId(1), "Foe", false);
        CombatState::new(vec![player, foe], range)
    }

    fn host() -> RecordHost {
        RecordHost::new(CharacterRecord::new("Hero", 100.0, 100.0, 100.0))
    }

    #[test]
    fn test_substitution_scales_with_chakra() {
        assert_eq!(chakra_scale(0.9), 1.0);
        assert_eq!(chakra_scale(0.2), 0.0);
        assert_eq!(chakra_scale(0.1), 0.0);
        assert!((chakra_scale(0.5) - 0.5).abs() < 1e-6);
        assert!(substitution_chance(Rank::S) > substitution_chance(Rank::C));
    }

    #[test]
    fn test_profile_boosts_reactions() {
        let catalog = ActionCatalog::standard();
        let strike = catalog.get(STRIKE).unwrap();
        let attacker = Combatant::new(CombatantId::PLAYER, "Hero", true);
        let mut defender = Combatant::new(CombatantId(1), "Foe", false);
        let base = dodge_chance(&attacker, &defender, strike);
        defender.ai_profile = Some(AiProfile::Assassin);
        assert!((dodge_chance(&attacker, &defender, strike) - base - 0.2).abs() < 1e-6);
        defender.ai_profile = Some(AiProfile::Brawler);
        assert!((block_chance(&attacker, &defender, strike) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_advantageous_wall_negates() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Mid);
        state.combatants[1].known_actions.insert("Water Wall".into(), 1);
        let mut rng = SequenceRng::constant(0.0);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        let fireball = catalog.get("Fireball Jutsu").unwrap();
        let reaction = react(&mut ctx, 0, 1, fireball);
        assert!(matches!(reaction, Reaction::Wall { advantageous: true, .. }));
        assert!(reaction.negates());
        assert_eq!(state.combatants[1].vitals.chakra, 85.0);
    }

    #[test]
    fn test_dazed_defender_cannot_react() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        state.combatants[1].tags.add(Tag::new(TagKind::Dazed, 2));
        let mut rng = SequenceRng::constant(0.0);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        let strike = catalog.get(STRIKE).unwrap();
        assert_eq!(react(&mut ctx, 0, 1, strike), Reaction::None);
    }

    #[test]
    fn test_dodge_at_engaged_range() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        state.combatants[1].attributes.agility = 60.0;
        // Dodge roll passes, contest fuzz at 1.2x favours the defender
        let mut rng = SequenceRng::new(vec![0.0, 0.99]);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        let strike = catalog.get(STRIKE).unwrap();
        assert_eq!(react(&mut ctx, 0, 1, strike), Reaction::Dodge { success: true });
        assert_eq!(state.combatants[1].vitals.stamina, 94.0);
    }

    #[test]
    fn test_trap_springs_on_dash() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Mid);
        state.combatants[1]
            .tags
            .add(Tag::new(TagKind::TrapReady, 5).with_payload(25.0));
        let mut rng = SequenceRng::constant(0.99);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        let dash = catalog.get(DASH).unwrap();
        assert_eq!(react(&mut ctx, 0, 1, dash), Reaction::TrapSprung { damage: 25.0 });
        assert_eq!(state.combatants[0].vitals.health, 75.0);
        assert_eq!(state.combatants[0].posture, crate::combat::posture::Posture::Exposed);
        assert!(!state.combatants[1].has_tag(TagKind::TrapReady));
    }

    #[test]
    fn test_trap_springs_while_casting_or_dazed() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let dash = catalog.get(DASH).unwrap();

        for dazed in [false, true] {
            let mut state = duel(Range::Mid);
            let foe = &mut state.combatants[1];
            foe.tags.add(Tag::new(TagKind::TrapReady, 5).with_payload(25.0));
            if dazed {
                foe.tags.add(Tag::new(TagKind::Dazed, 2));
            } else {
                foe.casting = Some(CastingState {
                    action: "Chidori".into(),
                    target: CombatantId::PLAYER,
                    ticks_remaining: 2,
                });
            }
            let mut rng = SequenceRng::constant(0.99);
            let mut host = host();
            let mut ctx = TurnContext {
                state: &mut state,
                catalog: &catalog,
                config: &config,
                rng: &mut rng,
                host: &mut host,
            };
            assert_eq!(
                react(&mut ctx, 0, 1, dash),
                Reaction::TrapSprung { damage: 25.0 },
                "dazed: {}",
                dazed
            );
            assert_eq!(state.combatants[0].vitals.health, 75.0);
            assert!(!state.combatants[1].has_tag(TagKind::TrapReady));
        }
    }
}
