//! Host game interface
//!
//! The engine never touches the outside world directly. Narration, player
//! choices, vitals write-back, progression and the end-of-fight callback all
//! go through [`CombatHost`].

use crate::actions::catalog::Action;
use crate::actions::effect::{ActionType, Category};
use crate::combat::combatant::{Combatant, Vitals};
use crate::combat::events::CombatEvent;
use crate::combat::lifecycle::Rewards;
use crate::combat::state::CombatState;
use crate::core::types::Element;
use crate::records::CharacterRecord;

pub trait CombatHost {
    /// Write-only narrative sink
    fn narrate(&mut self, event: &CombatEvent);

    /// Pick the player's action from the usable set
    ///
    /// Returning `None` or an unknown name makes the player Guard.
    fn choose_player_action(
        &mut self,
        _player: &Combatant,
        usable: &[&Action],
        _state: &CombatState,
    ) -> Option<String> {
        usable
            .iter()
            .find(|a| a.kind == ActionType::Offensive)
            .or_else(|| usable.first())
            .map(|a| a.name.clone())
    }

    /// Player vitals after every resolution
    fn sync_vitals(&mut self, _vitals: &Vitals) {}

    /// Player technique usage, for progression outside the fight
    fn record_skill_usage(&mut self, _category: Category, _element: Option<Element>) {}

    fn apply_rewards(&mut self, _rewards: &Rewards) {}

    fn apply_injury(&mut self, _injury: &str) {}

    /// Called exactly once per fight
    fn on_combat_end(&mut self, _victory: bool) {}
}

/// Host that owns the player's record and keeps every event
///
/// Used by the CLI runner and by tests.
#[derive(Debug, Clone)]
pub struct RecordHost {
    pub record: CharacterRecord,
    pub events: Vec<CombatEvent>,
    pub skill_usage: Vec<(Category, Option<Element>)>,
    /// Every `on_combat_end` call, in order
    pub endings: Vec<bool>,
    /// Scripted player choices, consumed front to back
    pub scripted: Vec<String>,
    pub echo: bool,
}

impl RecordHost {
    pub fn new(record: CharacterRecord) -> Self {
        Self {
            record,
            events: Vec::new(),
            skill_usage: Vec::new(),
            endings: Vec::new(),
            scripted: Vec::new(),
            echo: false,
        }
    }

    /// Queue player choices; once exhausted the default choice applies
    pub fn with_script(mut self, actions: &[&str]) -> Self {
        self.scripted = actions.iter().rev().map(|s| s.to_string()).collect();
        self
    }

    /// Print every event as it arrives
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn outcome(&self) -> Option<bool> {
        self.endings.first().copied()
    }
}

impl CombatHost for RecordHost {
    fn narrate(&mut self, event: &CombatEvent) {
        if self.echo {
            println!("[{:>4}] {}", event.tick, event.message);
        }
        self.events.push(event.clone());
    }

    fn choose_player_action(
        &mut self,
        _player: &Combatant,
        usable: &[&Action],
        _state: &CombatState,
    ) -> Option<String> {
        if let Some(next) = self.scripted.pop() {
            return Some(next);
        }
        // Hardest-hitting offensive option, else whatever comes first
        usable
            .iter()
            .filter(|a| a.kind == ActionType::Offensive)
            .max_by(|a, b| a.base_power.total_cmp(&b.base_power))
            .or_else(|| usable.first())
            .map(|a| a.name.clone())
    }

    fn sync_vitals(&mut self, vitals: &Vitals) {
        self.record.apply_vitals(vitals);
    }

    fn record_skill_usage(&mut self, category: Category, element: Option<Element>) {
        self.skill_usage.push((category, element));
    }

    fn apply_rewards(&mut self, rewards: &Rewards) {
        self.record.apply_rewards(rewards);
    }

    fn apply_injury(&mut self, injury: &str) {
        self.record.apply_injury(injury);
    }

    fn on_combat_end(&mut self, victory: bool) {
        self.endings.push(victory);
    }
}
