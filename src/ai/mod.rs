//! AI decision making for non-player combatants
//!
//! - `phase`: coarse fight progress and phase gating
//! - `profile`: fighting-style affinities
//! - `scoring`: pure weighted scoring of candidate actions
//! - `desperation`: health-driven tiers
//! - `decision`: enumeration, conservation and top-tier selection

pub mod decision;
pub mod desperation;
pub mod phase;
pub mod profile;
pub mod scoring;

pub use decision::{decide, Decision, DecisionReason};
pub use phase::{combat_phase, CombatPhase};
pub use profile::AiProfile;
pub use scoring::{score_action, ScoringContext};
