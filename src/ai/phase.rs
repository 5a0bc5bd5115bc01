//! Combat phase classification
//!
//! Fights move through four coarse phases that gate which techniques the AI
//! considers:
//! - FeelingOut: probing with basics while everyone is healthy
//! - Escalation: mid-rank techniques, no big guns yet
//! - Climax: everything is allowed
//! - Resolution: finishers

use serde::{Deserialize, Serialize};

use crate::actions::catalog::{Action, ANALYZE, DASH, GUARD, KUNAI_STAB, STRIKE};
use crate::combat::state::CombatState;
use crate::core::config::CombatConfig;
use crate::core::rng::RandomSource;
use crate::core::types::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatPhase {
    FeelingOut,
    Escalation,
    Climax,
    Resolution,
}

/// Basics allowed while feeling the opponent out, on top of all E/D ranks
pub const FEELING_OUT_WHITELIST: &[&str] = &[
    STRIKE,
    GUARD,
    ANALYZE,
    DASH,
    KUNAI_STAB,
    "Shuriken Throw",
    "Clone Jutsu",
    "Transformation Jutsu",
];

/// Ticks the opening phase can last at most
pub const FEELING_OUT_TICKS: u64 = 15;

/// Classify the fight; pure in health, tick and rank history
pub fn combat_phase(state: &CombatState) -> CombatPhase {
    let health = state.total_health_fraction();
    if health > 0.8 && state.tick < FEELING_OUT_TICKS {
        CombatPhase::FeelingOut
    } else if health > 0.4 && !state.high_rank_used() {
        CombatPhase::Escalation
    } else if health > 0.2 {
        CombatPhase::Climax
    } else {
        CombatPhase::Resolution
    }
}

/// Restrict candidates to what suits the phase
///
/// Escalation rolls once for an override that lets A/S ranks through.
/// Resolution keeps only finishers unless there are none.
pub fn filter_for_phase<'a>(
    actions: Vec<&'a Action>,
    phase: CombatPhase,
    config: &CombatConfig,
    rng: &mut dyn RandomSource,
) -> Vec<&'a Action> {
    match phase {
        CombatPhase::FeelingOut => actions
            .into_iter()
            .filter(|a| a.rank <= Rank::D || FEELING_OUT_WHITELIST.contains(&a.name.as_str()))
            .collect(),
        CombatPhase::Escalation => {
            if rng.chance(config.escalation_override_chance) {
                actions
            } else {
                actions.into_iter().filter(|a| a.rank < Rank::A).collect()
            }
        }
        CombatPhase::Climax => actions,
        CombatPhase::Resolution => {
            let finishers: Vec<&Action> =
                actions.iter().copied().filter(|a| a.is_finisher()).collect();
            if finishers.is_empty() {
                actions
            } else {
                finishers
            }
        }
    }
}
