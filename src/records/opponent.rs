//! Opponent templates
//!
//! Templates are static data: stats, known techniques, AI profile and
//! equipment. Procedural generation belongs to the host game; the engine
//! only consumes the finished template.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ai::profile::AiProfile;
use crate::combat::combatant::Attributes;
use crate::combat::skill::SkillLevels;
use crate::core::error::{CombatError, Result};
use crate::core::types::Range;

fn default_vital() -> f32 {
    100.0
}

fn default_temperament() -> f32 {
    50.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentTemplate {
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default = "default_vital")]
    pub max_health: f32,
    #[serde(default = "default_vital")]
    pub max_chakra: f32,
    #[serde(default = "default_vital")]
    pub max_stamina: f32,
    #[serde(default)]
    pub skills: SkillLevels,
    /// Learned techniques beyond the innate set
    #[serde(default)]
    pub techniques: Vec<String>,
    pub ai_profile: AiProfile,
    /// Item name to quantity
    #[serde(default)]
    pub equipment: BTreeMap<String, u32>,
    #[serde(default)]
    pub preferred_range: Option<Range>,
    #[serde(default = "default_temperament")]
    pub aggression: f32,
    #[serde(default = "default_temperament")]
    pub resolve: f32,
}

impl OpponentTemplate {
    pub fn new(name: impl Into<String>, ai_profile: AiProfile) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::default(),
            max_health: default_vital(),
            max_chakra: default_vital(),
            max_stamina: default_vital(),
            skills: SkillLevels::new(),
            techniques: Vec::new(),
            ai_profile,
            equipment: BTreeMap::new(),
            preferred_range: None,
            aggression: default_temperament(),
            resolve: default_temperament(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_health <= 0.0 {
            return Err(CombatError::InvalidConfig(format!(
                "opponent {} must have positive max_health",
                self.name
            )));
        }
        if self.max_chakra < 0.0 || self.max_stamina < 0.0 {
            return Err(CombatError::InvalidConfig(format!(
                "opponent {} has negative resource maxima",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    opponents: Vec<OpponentTemplate>,
}

/// Parse an opponent roster (`[[opponents]]` tables)
pub fn parse_opponents(contents: &str) -> Result<Vec<OpponentTemplate>> {
    let roster: RosterFile = toml::from_str(contents)?;
    for template in &roster.opponents {
        template.validate()?;
    }
    Ok(roster.opponents)
}

/// Load an opponent roster from a TOML file
pub fn load_opponents(path: impl AsRef<Path>) -> Result<Vec<OpponentTemplate>> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_opponents(&contents)
}
