//! Player character record
//!
//! Owned by the host game. The engine reads it at combat start, writes
//! vitals back after every resolution and applies rewards or injuries
//! when the fight ends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::combatant::{Attributes, Vitals};
use crate::combat::lifecycle::Rewards;
use crate::combat::skill::{Skill, SkillLevels};
use crate::core::types::Range;

/// Skill experience needed per level
pub const XP_PER_LEVEL: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    pub health: f32,
    pub max_health: f32,
    pub chakra: f32,
    pub max_chakra: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    #[serde(default)]
    pub skills: SkillLevels,
    /// Learned techniques and their level
    #[serde(default)]
    pub techniques: BTreeMap<String, u32>,
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
    #[serde(default)]
    pub preferred_range: Option<Range>,

    // Progression written back by the engine
    /// Combat experience
    #[serde(default)]
    pub cexp: u32,
    /// Experience toward the next level of each skill
    #[serde(default)]
    pub skill_xp: BTreeMap<Skill, u32>,
    /// Familiarity with named opponents
    #[serde(default)]
    pub familiarity: BTreeMap<String, u32>,
    #[serde(default)]
    pub injuries: Vec<String>,
}

impl CharacterRecord {
    /// A fresh record with full vitals
    pub fn new(name: impl Into<String>, max_health: f32, max_chakra: f32, max_stamina: f32) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::default(),
            health: max_health,
            max_health,
            chakra: max_chakra,
            max_chakra,
            stamina: max_stamina,
            max_stamina,
            skills: SkillLevels::new(),
            techniques: BTreeMap::new(),
            inventory: BTreeMap::new(),
            preferred_range: None,
            cexp: 0,
            skill_xp: BTreeMap::new(),
            familiarity: BTreeMap::new(),
            injuries: Vec::new(),
        }
    }

    /// Copy current vitals back from the fight
    pub fn apply_vitals(&mut self, vitals: &Vitals) {
        self.health = vitals.health.clamp(0.0, self.max_health);
        self.chakra = vitals.chakra.clamp(0.0, self.max_chakra);
        self.stamina = vitals.stamina.clamp(0.0, self.max_stamina);
    }

    /// Fold victory rewards into the record
    ///
    /// Experience for a skill the record has never trained is dropped with a
    /// warning.
    pub fn apply_rewards(&mut self, rewards: &Rewards) {
        self.cexp += rewards.cexp;

        for (&skill, &xp) in &rewards.skill_xp {
            if !self.skills.contains(skill) {
                tracing::warn!("{} has no {:?} skill; dropping {} xp", self.name, skill, xp);
                continue;
            }
            let total = self.skill_xp.get(&skill).copied().unwrap_or(0) + xp;
            let levels = total / XP_PER_LEVEL;
            if levels > 0 {
                let level = self.skills.get(skill) + levels;
                self.skills.set(skill, level);
                tracing::info!("{} reached {:?} level {}", self.name, skill, level);
            }
            self.skill_xp.insert(skill, total % XP_PER_LEVEL);
        }

        for (&attribute, &gain) in &rewards.attribute_gains {
            self.attributes.add(attribute, gain);
        }

        for (opponent, &amount) in &rewards.familiarity {
            *self.familiarity.entry(opponent.clone()).or_insert(0) += amount;
        }
    }

    pub fn apply_injury(&mut self, injury: &str) {
        self.injuries.push(injury.to_string());
    }
}
