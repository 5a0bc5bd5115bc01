pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use config::{load_config, CombatConfig, DesperationTier};
pub use error::{CombatError, Result};
pub use rng::{CombatRng, RandomSource, SequenceRng};
pub use types::{CombatantId, Element, Range, Rank, Tick};
