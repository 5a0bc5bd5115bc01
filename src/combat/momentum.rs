//! Momentum: a short-memory combo counter
//!
//! Consecutive successes build momentum. Reaching the threshold converts it
//! into a permanent resolve and aggression boost and starts the count over.
//! Momentum never drops below zero.

use crate::combat::combatant::Combatant;
use crate::core::config::CombatConfig;

/// Result of a momentum change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentumShift {
    /// Counter moved, no surge
    Steady,
    /// Threshold reached; bonuses granted and counter reset
    Surge,
}

/// Add one point, surging at the threshold
pub fn gain(combatant: &mut Combatant, config: &CombatConfig) -> MomentumShift {
    combatant.momentum += 1;
    if combatant.momentum >= config.momentum_threshold {
        combatant.momentum = 0;
        combatant.resolve = (combatant.resolve + config.momentum_resolve_bonus).clamp(0.0, 100.0);
        combatant.aggression =
            (combatant.aggression + config.momentum_aggression_bonus).clamp(0.0, 100.0);
        return MomentumShift::Surge;
    }
    MomentumShift::Steady
}

pub fn lose(combatant: &mut Combatant, amount: u32) {
    combatant.momentum = combatant.momentum.saturating_sub(amount);
}

/// Attacker landed a hit
pub fn on_hit(attacker: &mut Combatant, target: &mut Combatant, config: &CombatConfig) -> MomentumShift {
    lose(target, config.momentum_loss_on_hit);
    gain(attacker, config)
}

/// Attacker's action failed to land
pub fn on_miss(attacker: &mut Combatant) {
    lose(attacker, 1);
}

/// Defender dodged; the attacker still loses a point
pub fn on_dodge(attacker: &mut Combatant, defender: &mut Combatant, config: &CombatConfig) -> MomentumShift {
    on_miss(attacker);
    gain(defender, config)
}
