//! Desperation tiers
//!
//! As health falls past configured thresholds a combatant hits harder and
//! stops bothering to guard. Each tier is crossed once; a persistent
//! `Desperate` tag records the current level.

use crate::combat::combatant::Combatant;
use crate::combat::tags::{Tag, TagKind, UNTIL_CLEARED};
use crate::core::config::CombatConfig;

/// Level counted as "high" desperation by the AI
pub const HIGH_DESPERATION: usize = 2;

/// Number of tiers whose threshold lies above this health fraction
pub fn tier_for(health_fraction: f32, config: &CombatConfig) -> usize {
    config
        .desperation_tiers
        .iter()
        .filter(|tier| health_fraction < tier.health_below)
        .count()
}

pub fn damage_multiplier(level: usize, config: &CombatConfig) -> f32 {
    match level.checked_sub(1) {
        Some(i) => config
            .desperation_tiers
            .get(i)
            .map_or(1.0, |tier| tier.damage_multiplier),
        None => 1.0,
    }
}

/// Chance a desperate fighter ignores the urge to guard
pub fn ignore_guard_chance(level: usize, config: &CombatConfig) -> f32 {
    match level.checked_sub(1) {
        Some(i) => config
            .desperation_tiers
            .get(i)
            .map_or(0.0, |tier| tier.ignore_guard_chance),
        None => 0.0,
    }
}

/// Raise the combatant's level to match its health
///
/// Returns each newly crossed level in order. Levels never go back down.
pub fn update(combatant: &mut Combatant, config: &CombatConfig) -> Vec<usize> {
    let target = tier_for(combatant.vitals.health_fraction(), config);
    if target <= combatant.desperation_level || !combatant.is_alive() {
        return Vec::new();
    }
    let crossed: Vec<usize> = (combatant.desperation_level + 1..=target).collect();
    combatant.desperation_level = target;
    combatant
        .tags
        .replace(Tag::new(TagKind::Desperate, UNTIL_CLEARED).with_payload(target as f32));
    crossed
}
