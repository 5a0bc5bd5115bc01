//! Timed tags on combatants and the battlefield
//!
//! A tag is a closed [`TagKind`] inside a shared envelope. Durations count
//! down once per tick; [`UNTIL_CLEARED`] never counts down and is removed
//! only by the rule that created it (escape, detection, consumption).

use serde::{Deserialize, Serialize};

use crate::core::types::CombatantId;

/// Duration sentinel for tags that last until their condition clears
pub const UNTIL_CLEARED: i32 = 999;

/// Every effect a tag can represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    /// Damage over time (payload per tick)
    Burning,
    /// Damage over time (payload per tick)
    Poisoned,
    /// Damage over time (payload per tick)
    Bleeding,
    /// Halved evasion, no reactions
    Dazed,
    /// Halved gauge gain
    Slowed,
    /// Held by `source`; restricts actions
    Grappled,
    /// Knocked into the air; skips standard turns
    Airborne,
    /// Transformed; next offensive hit is an ambush
    Disguised,
    /// Decoy clones that may absorb hostile actions
    CloneDecoy,
    /// Armed trap (payload = power) that springs on a Dash
    TrapReady,
    /// Marker that `source` has been studied
    Analyzed,
    /// Desperation tier marker (payload = tier)
    Desperate,
    /// Battlefield mist; raises evasion for everyone
    MistCover,
}

impl TagKind {
    pub fn is_damage_over_time(&self) -> bool {
        matches!(self, TagKind::Burning | TagKind::Poisoned | TagKind::Bleeding)
    }

    /// Narrative line fired when the tag runs out
    pub fn expiry_message(&self) -> &'static str {
        match self {
            TagKind::Burning => "the flames die down",
            TagKind::Poisoned => "the poison runs its course",
            TagKind::Bleeding => "the bleeding stops",
            TagKind::Dazed => "shakes off the illusion",
            TagKind::Slowed => "moves freely again",
            TagKind::Grappled => "is released from the hold",
            TagKind::Airborne => "lands back on their feet",
            TagKind::Disguised => "drops the disguise",
            TagKind::CloneDecoy => "the clones dissipate",
            TagKind::TrapReady => "the trap goes slack",
            TagKind::Analyzed => "loses track of the analysis",
            TagKind::Desperate => "regains composure",
            TagKind::MistCover => "the mist clears",
        }
    }
}

/// A single active tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub kind: TagKind,
    /// Ticks left; [`UNTIL_CLEARED`] for persistent tags
    pub remaining: i32,
    /// Caster, grappler, or analysed opponent depending on kind
    pub source: Option<CombatantId>,
    pub payload: Option<f32>,
}

impl Tag {
    pub fn new(kind: TagKind, remaining: i32) -> Self {
        Self {
            kind,
            remaining,
            source: None,
            payload: None,
        }
    }

    pub fn from_source(mut self, source: CombatantId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_payload(mut self, payload: f32) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_persistent(&self) -> bool {
        self.remaining == UNTIL_CLEARED
    }
}

/// What happened to a tag set during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagTick {
    pub expired: Vec<Tag>,
    pub damage: f32,
}

/// Tags owned by one combatant or by the battlefield
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag, refreshing an existing one of the same kind and source
    ///
    /// The refreshed tag keeps the longer duration and takes the new payload.
    pub fn add(&mut self, tag: Tag) {
        if let Some(existing) = self
            .tags
            .iter_mut()
            .find(|t| t.kind == tag.kind && t.source == tag.source)
        {
            existing.remaining = existing.remaining.max(tag.remaining);
            if tag.payload.is_some() {
                existing.payload = tag.payload;
            }
            return;
        }
        self.tags.push(tag);
    }

    /// Replace every tag of this kind with `tag`
    pub fn replace(&mut self, tag: Tag) {
        self.tags.retain(|t| t.kind != tag.kind);
        self.tags.push(tag);
    }

    pub fn has(&self, kind: TagKind) -> bool {
        self.tags.iter().any(|t| t.kind == kind)
    }

    pub fn get(&self, kind: TagKind) -> Option<&Tag> {
        self.tags.iter().find(|t| t.kind == kind)
    }

    pub fn get_mut(&mut self, kind: TagKind) -> Option<&mut Tag> {
        self.tags.iter_mut().find(|t| t.kind == kind)
    }

    /// Tag of a kind placed by (or about) a specific combatant
    pub fn find_from(&self, kind: TagKind, source: CombatantId) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|t| t.kind == kind && t.source == Some(source))
    }

    /// Remove the first tag of a kind
    pub fn remove(&mut self, kind: TagKind) -> Option<Tag> {
        let index = self.tags.iter().position(|t| t.kind == kind)?;
        Some(self.tags.remove(index))
    }

    /// Shorten a tag; removes it when it runs out. Returns true if removed.
    pub fn consume(&mut self, kind: TagKind, ticks: i32) -> bool {
        let Some(tag) = self.get_mut(kind) else {
            return false;
        };
        if tag.is_persistent() {
            return false;
        }
        tag.remaining -= ticks;
        if tag.remaining <= 0 {
            self.remove(kind);
            return true;
        }
        false
    }

    /// Advance every tag by one tick
    ///
    /// Damage-over-time tags contribute their payload before counting down.
    /// Tags that reach zero are removed and reported exactly once.
    pub fn advance(&mut self) -> TagTick {
        let mut result = TagTick::default();

        for tag in self.tags.iter_mut() {
            if tag.kind.is_damage_over_time() {
                result.damage += tag.payload.unwrap_or(0.0).max(0.0);
            }
            if !tag.is_persistent() {
                tag.remaining -= 1;
            }
        }

        let (expired, kept): (Vec<Tag>, Vec<Tag>) =
            self.tags.drain(..).partition(|t| t.remaining <= 0);
        self.tags = kept;
        result.expired = expired;
        result
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
