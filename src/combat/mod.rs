//! Combat engine
//!
//! - `state`, `combatant`, `tags`, `posture`, `skill`: the data a fight is made of
//! - `scheduler`: the per-tick driver ([`Combat`])
//! - `resolution`, `reaction`, `momentum`: what happens when someone acts
//! - `lifecycle`: start, end, forfeit and rewards
//! - `host`, `events`: everything the outside world sees

pub mod combatant;
pub mod context;
pub mod events;
pub mod host;
pub mod lifecycle;
pub mod momentum;
pub mod posture;
pub mod reaction;
pub mod resolution;
pub mod scheduler;
pub mod skill;
pub mod state;
pub mod tags;

pub use combatant::{Attribute, Attributes, CastingState, Combatant, Vitals};
pub use events::{CombatEvent, CombatEventKind, Severity};
pub use host::{CombatHost, RecordHost};
pub use lifecycle::{compute_rewards, Rewards, BATTLE_EXHAUSTION};
pub use posture::Posture;
pub use reaction::Reaction;
pub use resolution::Outcome;
pub use scheduler::{Combat, CombatSnapshot, TickOutcome};
pub use skill::{Skill, SkillLevels};
pub use state::{Battlefield, CombatOutcome, CombatState};
pub use tags::{Tag, TagKind, TagSet};
