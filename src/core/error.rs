use thiserror::Error;

use crate::core::types::CombatantId;

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Combatant not found: {0}")]
    CombatantNotFound(CombatantId),

    #[error("Invalid action definition: {0}")]
    InvalidAction(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CombatError>;
