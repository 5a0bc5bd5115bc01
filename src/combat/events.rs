//! Narrative events
//!
//! Every resolved step emits one [`CombatEvent`] to the host. Events are
//! write-only: the engine never reads them back.

use serde::{Deserialize, Serialize};

use crate::combat::tags::TagKind;
use crate::core::types::{CombatantId, Range, Tick};

/// Presentation class of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Hit,
    Miss,
    Critical,
    Status,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEventKind {
    CombatStarted,
    ActionUsed { actor: CombatantId, action: String },
    CastStarted { actor: CombatantId, action: String, ticks: u32 },
    CastInterrupted { actor: CombatantId },
    Hit { attacker: CombatantId, target: CombatantId, damage: f32 },
    Missed { attacker: CombatantId, target: CombatantId },
    Reaction { defender: CombatantId, reaction: String, success: bool },
    DecoyAbsorbed { target: CombatantId },
    TrapSprung { owner: CombatantId, victim: CombatantId, damage: f32 },
    TagApplied { target: Option<CombatantId>, kind: TagKind },
    TagExpired { owner: Option<CombatantId>, kind: TagKind },
    TagDamage { target: CombatantId, kind: TagKind, damage: f32 },
    DisguiseDetected { disguised: CombatantId, observer: CombatantId },
    GrappleEscaped { actor: CombatantId },
    EscapeFailed { actor: CombatantId },
    GrappleReleased { actor: CombatantId },
    RangeChanged { range: Range },
    MomentumSurge { actor: CombatantId },
    Desperation { actor: CombatantId, level: usize },
    Defeated { actor: CombatantId },
    CombatEnded { victory: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub tick: Tick,
    pub kind: CombatEventKind,
    pub message: String,
    pub severity: Severity,
}

impl CombatEvent {
    pub fn new(tick: Tick, kind: CombatEventKind, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            tick,
            kind,
            message: message.into(),
            severity,
        }
    }
}
