//! Action definitions, the catalog and the usability predicate

pub mod catalog;
pub mod effect;
pub mod usability;

pub use catalog::{Action, ActionCatalog};
pub use effect::{ActionEffect, ActionType, Category, Complexity, EffectTag, Keyword, Reach};
pub use usability::{check_usable, is_usable, usable_actions, Unusable};
