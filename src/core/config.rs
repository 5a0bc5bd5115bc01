//! Combat configuration with documented constants
//!
//! Every tuned number the engine relies on is collected here so balancing
//! can happen in `data/combat.toml` without touching engine code.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{CombatError, Result};
use crate::core::types::Range;

/// One health threshold of the desperation ladder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesperationTier {
    /// Tier is entered once health fraction drops below this value
    pub health_below: f32,
    /// Outgoing damage multiplier while in this tier
    pub damage_multiplier: f32,
    /// Chance an AI in this tier skips its own stamina-conserving Guard
    pub ignore_guard_chance: f32,
}

/// Configuration for the combat engine
///
/// These values have been tuned to produce fights that last long enough
/// for phases to matter. Changing them will affect pacing and feel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === SCHEDULER ===
    /// Agility used for gauge gain when a combatant has none set
    pub base_agility: f32,

    /// Gauge value that grants a turn; subtracted when the turn is taken
    pub gauge_threshold: f32,

    /// Distance the fight opens at
    pub starting_range: Range,

    // === MOMENTUM ===
    /// Consecutive-hit count that converts into a resolve/aggression boost
    pub momentum_threshold: u32,

    /// Momentum the target loses when it is hit
    pub momentum_loss_on_hit: u32,

    /// Resolve gained when momentum crosses the threshold
    pub momentum_resolve_bonus: f32,

    /// Aggression gained when momentum crosses the threshold
    pub momentum_aggression_bonus: f32,

    // === DESPERATION ===
    /// Ladder of desperation tiers, ordered from mildest to most severe
    pub desperation_tiers: Vec<DesperationTier>,

    // === AI ===
    /// Stamina fraction below which the AI considers resting behind a guard
    pub stamina_conservation_threshold: f32,

    /// Chance to guard when below the conservation threshold with no recent guards
    pub guard_base_chance: f32,

    /// Multiplier applied to the guard chance per Guard in the recent ring
    pub guard_decay: f32,

    /// Score multiplier per repeat of the same action in the recent ring
    pub repetition_penalty: f32,

    /// Chance the AI picks among the top two candidates instead of the top three
    pub top_two_chance: f32,

    /// Chance Escalation lets an A/S rank technique through anyway
    pub escalation_override_chance: f32,

    // === RESOLUTION ===
    /// Chance an active clone decoy absorbs a hostile action
    pub clone_absorb_chance: f32,

    /// Clone duration consumed by one absorption
    pub clone_absorb_ticks: i32,

    /// Base chance per tick to see through a disguise
    pub disguise_detection_base: f32,

    /// Damage multiplier for an attack out of a disguise
    pub ambush_multiplier: f32,

    /// Damage multiplier against Exposed or Casting targets
    pub exposed_multiplier: f32,

    /// Power scale when a block only partially holds
    pub block_partial_scale: f32,

    /// Chance a successful dodge also repositions the dodger
    pub dodge_reposition_chance: f32,

    /// Largest fraction of a cost that skill can shave off
    pub cost_reduction_cap: f32,

    /// Skill level at which cost reduction saturates
    pub cost_reduction_skill_cap: u32,

    /// Fraction of max stamina restored by Guard
    pub guard_stamina_restore: f32,

    // === REWARDS ===
    /// Flat combat experience granted per defeated opponent
    pub cexp_per_opponent: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            base_agility: 30.0,
            gauge_threshold: 100.0,
            starting_range: Range::Mid,

            momentum_threshold: 3,
            momentum_loss_on_hit: 2,
            momentum_resolve_bonus: 5.0,
            momentum_aggression_bonus: 5.0,

            desperation_tiers: vec![
                DesperationTier {
                    health_below: 0.50,
                    damage_multiplier: 1.10,
                    ignore_guard_chance: 0.3,
                },
                DesperationTier {
                    health_below: 0.30,
                    damage_multiplier: 1.25,
                    ignore_guard_chance: 0.7,
                },
                DesperationTier {
                    health_below: 0.15,
                    damage_multiplier: 1.40,
                    ignore_guard_chance: 0.8,
                },
            ],

            stamina_conservation_threshold: 0.4,
            guard_base_chance: 0.6,
            guard_decay: 0.5,
            repetition_penalty: 0.45,
            top_two_chance: 0.7,
            escalation_override_chance: 0.2,

            clone_absorb_chance: 0.5,
            clone_absorb_ticks: 2,
            disguise_detection_base: 0.05,
            ambush_multiplier: 1.75,
            exposed_multiplier: 1.5,
            block_partial_scale: 0.6,
            dodge_reposition_chance: 0.3,
            cost_reduction_cap: 0.5,
            cost_reduction_skill_cap: 200,
            guard_stamina_restore: 0.15,

            cexp_per_opponent: 25,
        }
    }
}

impl CombatConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.gauge_threshold <= 0.0 {
            return Err(CombatError::InvalidConfig(
                "gauge_threshold must be positive".into(),
            ));
        }

        if self.momentum_threshold == 0 {
            return Err(CombatError::InvalidConfig(
                "momentum_threshold must be at least 1".into(),
            ));
        }

        // Tiers should get strictly more severe
        for pair in self.desperation_tiers.windows(2) {
            if pair[1].health_below >= pair[0].health_below {
                return Err(CombatError::InvalidConfig(format!(
                    "desperation tier at {} should be below the previous tier at {}",
                    pair[1].health_below, pair[0].health_below
                )));
            }
        }

        for chance in [
            self.guard_base_chance,
            self.top_two_chance,
            self.escalation_override_chance,
            self.clone_absorb_chance,
            self.dodge_reposition_chance,
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(CombatError::InvalidConfig(format!(
                    "probability {} is outside [0, 1]",
                    chance
                )));
            }
        }

        if !(0.0..1.0).contains(&self.cost_reduction_cap) {
            return Err(CombatError::InvalidConfig(
                "cost_reduction_cap must be in [0, 1)".into(),
            ));
        }

        Ok(())
    }
}

/// Load a combat config from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<CombatConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    CombatConfig::from_toml_str(&contents)
}
