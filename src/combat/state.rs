//! Combat state
//!
//! The single root of mutable fight state. Plain serializable data: the
//! host callback, catalog, config and random source live elsewhere.

use serde::{Deserialize, Serialize};

use crate::combat::combatant::Combatant;
use crate::combat::tags::TagSet;
use crate::core::types::{CombatantId, Range, Rank, Tick};

/// Shared ground both sides stand on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Battlefield {
    pub range: Range,
    pub tags: TagSet,
}

impl Battlefield {
    pub fn new(range: Range) -> Self {
        Self {
            range,
            tags: TagSet::new(),
        }
    }
}

/// A resolved action as remembered by the phase classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JutsuRecord {
    pub tick: Tick,
    pub actor: CombatantId,
    pub name: String,
    pub rank: Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    Undecided,
    Victory,
    Defeat,
    Forfeit,
}

impl CombatOutcome {
    pub fn is_victory(&self) -> bool {
        matches!(self, CombatOutcome::Victory)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    pub is_active: bool,
    pub tick: Tick,
    pub battlefield: Battlefield,
    /// Player first, then opponents in template order
    pub combatants: Vec<Combatant>,
    pub jutsu_history: Vec<JutsuRecord>,
    pub outcome: CombatOutcome,
}

impl CombatState {
    pub fn new(combatants: Vec<Combatant>, range: Range) -> Self {
        Self {
            is_active: true,
            tick: 0,
            battlefield: Battlefield::new(range),
            combatants,
            jutsu_history: Vec::new(),
            outcome: CombatOutcome::Undecided,
        }
    }

    pub fn range(&self) -> Range {
        self.battlefield.range
    }

    pub fn index_of(&self, id: CombatantId) -> Option<usize> {
        self.combatants.iter().position(|c| c.id == id)
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    pub fn player(&self) -> Option<&Combatant> {
        self.combatants.first().filter(|c| c.is_player)
    }

    /// Mutable access to two distinct combatants at once
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Combatant, &mut Combatant)> {
        if a == b || a >= self.combatants.len() || b >= self.combatants.len() {
            return None;
        }
        if a < b {
            let (left, right) = self.combatants.split_at_mut(b);
            Some((&mut left[a], &mut right[0]))
        } else {
            let (left, right) = self.combatants.split_at_mut(a);
            Some((&mut right[0], &mut left[b]))
        }
    }

    /// Are these two on opposite sides?
    pub fn are_opposed(&self, a: CombatantId, b: CombatantId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(x), Some(y)) => x.is_player != y.is_player,
            _ => false,
        }
    }

    /// Default target: first living opponent for the player, the player for AI
    pub fn default_target(&self, actor: CombatantId) -> Option<CombatantId> {
        let actor = self.get(actor)?;
        self.combatants
            .iter()
            .find(|c| c.is_player != actor.is_player && c.is_alive())
            .map(|c| c.id)
    }

    pub fn living_opponents(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| !c.is_player && c.is_alive())
    }

    /// Terminal condition, if reached
    pub fn terminal_outcome(&self) -> Option<CombatOutcome> {
        let player_down = self.player().map_or(true, |p| !p.is_alive());
        if player_down {
            return Some(CombatOutcome::Defeat);
        }
        if self.living_opponents().next().is_none() {
            return Some(CombatOutcome::Victory);
        }
        None
    }

    /// Combined health of everyone over combined maximum
    pub fn total_health_fraction(&self) -> f32 {
        let (current, max) = self
            .combatants
            .iter()
            .fold((0.0, 0.0), |(c, m), x| (c + x.vitals.health, m + x.vitals.max_health));
        if max > 0.0 {
            (current / max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Has anything of rank B or above been used yet?
    pub fn high_rank_used(&self) -> bool {
        self.jutsu_history.iter().any(|r| r.rank.is_high())
    }
}
