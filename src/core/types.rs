//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Identifier of a combatant inside one encounter
///
/// Ids are assigned in list order at combat start; the player is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub u32);

impl CombatantId {
    pub const PLAYER: CombatantId = CombatantId(0);
}

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Combat tick counter (simulation time unit)
pub type Tick = u64;

/// Shared engagement distance, ordered from closest to farthest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Range {
    Engaged,
    Short,
    #[default]
    Mid,
    Long,
}

impl Range {
    /// Is this a melee-appropriate distance?
    pub fn is_close(&self) -> bool {
        matches!(self, Range::Engaged | Range::Short)
    }
}

/// Action power tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Rank {
    #[default]
    E,
    D,
    C,
    B,
    A,
    S,
}

impl Rank {
    /// B, A and S rank techniques mark a fight as escalated
    pub fn is_high(&self) -> bool {
        *self >= Rank::B
    }
}

/// The five chakra natures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Wind,
    Lightning,
    Earth,
    Water,
}

impl Element {
    /// Element this one overpowers (Fire > Wind > Lightning > Earth > Water > Fire)
    pub fn beats(&self) -> Element {
        match self {
            Element::Fire => Element::Wind,
            Element::Wind => Element::Lightning,
            Element::Lightning => Element::Earth,
            Element::Earth => Element::Water,
            Element::Water => Element::Fire,
        }
    }

    /// Element that overpowers this one
    pub fn countered_by(&self) -> Element {
        match self {
            Element::Fire => Element::Water,
            Element::Wind => Element::Fire,
            Element::Lightning => Element::Wind,
            Element::Earth => Element::Lightning,
            Element::Water => Element::Earth,
        }
    }
}
