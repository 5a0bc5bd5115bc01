//! Combat posture system
//!
//! Posture is a combatant's momentary exposure. It decides who can be
//! punished for overextending and who is safely behind a guard.

use serde::{Deserialize, Serialize};

/// Posture - every combatant is always in exactly one posture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Posture {
    /// Behind a guard
    Guarded,
    /// Balanced and moving
    #[default]
    Mobile,
    /// Overextended or caught out; takes bonus damage
    Exposed,
    /// Weaving seals; takes bonus damage and can be interrupted
    Casting,
}

impl Posture {
    /// Is this posture open to bonus damage?
    pub fn is_vulnerable(&self) -> bool {
        matches!(self, Posture::Exposed | Posture::Casting)
    }
}

/// Events that trigger posture transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostureTrigger {
    /// Took any non-guarding action
    Acted,
    /// Raised a guard
    RaisedGuard,
    /// Started preparing a technique
    BeganCasting,
    /// Hit while preparing a technique
    CastInterrupted,
    /// Caught by a trap or a failed commitment
    CaughtOut,
    /// Escaped a hold or shook off a setback
    Recovered,
}

/// Posture transition rules (state machine)
pub fn transition(current: Posture, trigger: PostureTrigger) -> Posture {
    use Posture::*;
    use PostureTrigger::*;

    match (current, trigger) {
        (_, RaisedGuard) => Guarded,
        (_, BeganCasting) => Casting,
        (_, CastInterrupted) => Exposed,
        (_, CaughtOut) => Exposed,
        (_, Acted) => Mobile,
        (Exposed, Recovered) => Mobile,
        (current, Recovered) => current,
    }
}
