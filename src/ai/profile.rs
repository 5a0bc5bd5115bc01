//! AI fighting profiles
//!
//! A profile biases technique scoring toward a fighting style. The player
//! has no profile; every opponent template names one.

use serde::{Deserialize, Serialize};

use crate::actions::catalog::Action;
use crate::actions::effect::{ActionType, Category};

/// Fighting style of an AI combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiProfile {
    /// Close-range taijutsu fighter
    Brawler,
    /// Keeps distance and casts
    NinjutsuSpecialist,
    /// Tools, deception and ambushes
    Assassin,
}

/// Affinity multipliers for one profile (1.0 = neutral)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileWeights {
    pub taijutsu: f32,
    pub ninjutsu: f32,
    pub genjutsu: f32,
    pub tool: f32,
    /// Deception-shaped or Deceptive-flagged actions
    pub deception: f32,
    /// Any Offensive action
    pub offensive: f32,
    /// Added to the Taijutsu dodge reaction chance
    pub dodge_bonus: f32,
    /// Added to the Taijutsu block reaction chance
    pub block_bonus: f32,
}

impl Default for ProfileWeights {
    fn default() -> Self {
        Self {
            taijutsu: 1.0,
            ninjutsu: 1.0,
            genjutsu: 1.0,
            tool: 1.0,
            deception: 1.0,
            offensive: 1.0,
            dodge_bonus: 0.0,
            block_bonus: 0.0,
        }
    }
}

impl AiProfile {
    pub fn weights(&self) -> ProfileWeights {
        match self {
            AiProfile::Brawler => ProfileWeights {
                taijutsu: 2.5,
                ninjutsu: 0.05,
                genjutsu: 0.05,
                tool: 0.5,
                block_bonus: 0.2,
                ..ProfileWeights::default()
            },
            AiProfile::NinjutsuSpecialist => ProfileWeights {
                taijutsu: 0.2,
                ninjutsu: 3.0,
                ..ProfileWeights::default()
            },
            AiProfile::Assassin => ProfileWeights {
                tool: 2.0,
                deception: 4.0,
                offensive: 1.5,
                dodge_bonus: 0.2,
                ..ProfileWeights::default()
            },
        }
    }

    /// Combined affinity multiplier for an action
    pub fn affinity(&self, action: &Action) -> f32 {
        let weights = self.weights();
        let mut factor = match action.category {
            Category::Taijutsu => weights.taijutsu,
            Category::Ninjutsu => weights.ninjutsu,
            Category::Genjutsu => weights.genjutsu,
            Category::Tool => weights.tool,
            Category::Innate | Category::Tactical => 1.0,
        };
        if action.is_deceptive() {
            factor *= weights.deception;
        }
        if action.kind == ActionType::Offensive {
            factor *= weights.offensive;
        }
        factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::catalog::{ActionCatalog, STRIKE};

    #[test]
    fn test_brawler_prefers_taijutsu() {
        let catalog = ActionCatalog::standard();
        let strike = catalog.get(STRIKE).unwrap();
        let fireball = catalog.get("Fireball Jutsu").unwrap();
        let brawler = AiProfile::Brawler;
        assert!(brawler.affinity(strike) > brawler.affinity(fireball));
    }

    #[test]
    fn test_assassin_stacks_deception_tool_and_offense() {
        let catalog = ActionCatalog::standard();
        let shadow = catalog.get("Shadow Shuriken").unwrap();
        assert!((AiProfile::Assassin.affinity(shadow) - 12.0).abs() < 1e-4);
        assert!((AiProfile::Brawler.affinity(shadow) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_specialist_avoids_taijutsu() {
        let catalog = ActionCatalog::standard();
        let strike = catalog.get(STRIKE).unwrap();
        assert!((AiProfile::NinjutsuSpecialist.affinity(strike) - 0.2).abs() < 1e-6);
    }
}
