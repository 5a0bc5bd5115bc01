//! Combat skill levels
//!
//! Skills gate techniques, shave costs and casting time, and add flat
//! damage. Levels are unbounded integers; cost reduction saturates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Trainable disciplines
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    Taijutsu,
    Ninjutsu,
    Genjutsu,
    Shurikenjutsu,
    /// Hand-seal speed; shortens casting
    HandSeals,
    /// Reduces chakra costs
    ChakraControl,
    /// Reduces stamina costs
    Endurance,
}

/// Per-combatant skill table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillLevels {
    levels: BTreeMap<Skill, u32>,
}

impl SkillLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of a skill; untrained skills are 0
    pub fn get(&self, skill: Skill) -> u32 {
        self.levels.get(&skill).copied().unwrap_or(0)
    }

    /// Has this skill been trained at all (even at level 0)?
    pub fn contains(&self, skill: Skill) -> bool {
        self.levels.contains_key(&skill)
    }

    pub fn set(&mut self, skill: Skill, level: u32) {
        self.levels.insert(skill, level);
    }

    pub fn with(mut self, skill: Skill, level: u32) -> Self {
        self.set(skill, level);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Skill, u32)> + '_ {
        self.levels.iter().map(|(s, l)| (*s, *l))
    }
}

impl FromIterator<(Skill, u32)> for SkillLevels {
    fn from_iter<T: IntoIterator<Item = (Skill, u32)>>(iter: T) -> Self {
        Self {
            levels: iter.into_iter().collect(),
        }
    }
}

/// Fraction of a cost removed by a skill level
///
/// Linear in the level until `skill_cap`, where it reaches `max_reduction`.
pub fn cost_reduction(level: u32, max_reduction: f32, skill_cap: u32) -> f32 {
    if skill_cap == 0 {
        return 0.0;
    }
    let progress = level.min(skill_cap) as f32 / skill_cap as f32;
    (max_reduction * progress).clamp(0.0, max_reduction)
}

/// Casting ticks removed by hand-seal training
pub fn hand_seal_reduction(level: u32) -> u32 {
    level / 25
}
