//! Shinobi Duel - tick-driven shinobi combat engine

pub mod actions;
pub mod ai;
pub mod combat;
pub mod core;
pub mod records;

pub use crate::actions::{Action, ActionCatalog};
pub use crate::combat::{Combat, CombatHost, CombatOutcome, CombatState, RecordHost, TickOutcome};
pub use crate::core::{CombatConfig, CombatError, CombatRng, RandomSource, Result};
pub use crate::records::{CharacterRecord, OpponentTemplate};
