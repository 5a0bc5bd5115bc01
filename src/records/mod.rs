//! External records the engine reads from and writes back to
//!
//! The player's [`CharacterRecord`] lives outside the fight; opponents are
//! built from [`OpponentTemplate`]s loaded from data files.

pub mod character;
pub mod opponent;

pub use character::CharacterRecord;
pub use opponent::{load_opponents, OpponentTemplate};
