//! AI action selection
//!
//! Enumerate usable actions, gate them by phase, maybe conserve stamina,
//! score the rest and pick uniformly among the top few.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::actions::catalog::{Action, ActionCatalog, GUARD, STRUGGLE};
use crate::actions::usability::{is_usable, usable_actions};
use crate::ai::desperation;
use crate::ai::phase::{combat_phase, filter_for_phase, CombatPhase};
use crate::ai::scoring::{score_action, ScoringContext};
use crate::combat::combatant::Combatant;
use crate::combat::state::CombatState;
use crate::core::config::CombatConfig;
use crate::core::rng::RandomSource;
use crate::core::types::CombatantId;

/// What the AI settled on
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: String,
    pub target: Option<CombatantId>,
    pub reason: DecisionReason,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionReason {
    /// Nothing usable
    Fallback,
    /// Tired and chose to guard
    Conserving,
    /// Picked from the top-scored candidates
    Scored { score: f32, phase: CombatPhase },
}

/// Stamina conservation roll
///
/// Each recent Guard halves (by default) the chance to guard again. A
/// desperate fighter may skip the check entirely.
fn wants_to_conserve(actor: &Combatant, config: &CombatConfig, rng: &mut dyn RandomSource) -> bool {
    if actor.vitals.stamina_fraction() >= config.stamina_conservation_threshold {
        return false;
    }
    if actor.desperation_level > 0
        && rng.chance(desperation::ignore_guard_chance(actor.desperation_level, config))
    {
        return false;
    }
    let recent_guards = actor.recent_count(GUARD) as i32;
    let chance = config.guard_base_chance * config.guard_decay.powi(recent_guards);
    rng.chance(chance)
}

/// Rank candidates best first; ties keep enumeration order
pub fn rank_candidates<'a>(candidates: &[&'a Action], ctx: &ScoringContext<'_>) -> Vec<(&'a Action, f32)> {
    let mut scored: Vec<(&Action, f32)> = candidates
        .iter()
        .map(|action| (*action, score_action(action, ctx)))
        .collect();
    scored.sort_by_key(|(_, score)| Reverse(OrderedFloat(*score)));
    scored
}

/// Choose an action for the AI combatant at `actor_index`
pub fn decide(
    actor_index: usize,
    state: &CombatState,
    catalog: &ActionCatalog,
    config: &CombatConfig,
    rng: &mut dyn RandomSource,
) -> Decision {
    let Some(actor) = state.combatants.get(actor_index) else {
        return Decision {
            action: STRUGGLE.to_string(),
            target: None,
            reason: DecisionReason::Fallback,
        };
    };
    let target_id = state.default_target(actor.id);
    let range = state.range();

    let phase = combat_phase(state);
    let candidates = filter_for_phase(usable_actions(actor, catalog, range), phase, config, rng);

    if candidates.is_empty() {
        return Decision {
            action: STRUGGLE.to_string(),
            target: target_id,
            reason: DecisionReason::Fallback,
        };
    }

    if is_usable(actor, catalog, GUARD, range) && wants_to_conserve(actor, config, rng) {
        return Decision {
            action: GUARD.to_string(),
            target: target_id,
            reason: DecisionReason::Conserving,
        };
    }

    let ctx = ScoringContext {
        actor,
        target: target_id.and_then(|id| state.get(id)),
        phase,
        range,
        config,
    };
    let ranked = rank_candidates(&candidates, &ctx);

    let tier = if rng.chance(config.top_two_chance) { 2 } else { 3 };
    let pool = tier.min(ranked.len());
    let (action, score) = ranked[rng.index(pool)];

    Decision {
        action: action.name.clone(),
        target: target_id,
        reason: DecisionReason::Scored { score, phase },
    }
}
