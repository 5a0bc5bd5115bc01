//! Borrowed view of everything one resolution step needs

use crate::actions::catalog::ActionCatalog;
use crate::combat::events::{CombatEvent, CombatEventKind, Severity};
use crate::combat::host::CombatHost;
use crate::combat::state::CombatState;
use crate::core::config::CombatConfig;
use crate::core::rng::RandomSource;

pub struct TurnContext<'a> {
    pub state: &'a mut CombatState,
    pub catalog: &'a ActionCatalog,
    pub config: &'a CombatConfig,
    pub rng: &'a mut dyn RandomSource,
    pub host: &'a mut dyn CombatHost,
}

impl<'a> TurnContext<'a> {
    /// Narrate an event stamped with the current tick
    pub fn emit(&mut self, kind: CombatEventKind, message: impl Into<String>, severity: Severity) {
        let event = CombatEvent::new(self.state.tick, kind, message, severity);
        tracing::trace!(tick = event.tick, "{}", event.message);
        self.host.narrate(&event);
    }

    /// Name of a combatant by index, for narration
    pub fn name(&self, index: usize) -> String {
        self.state
            .combatants
            .get(index)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "someone".to_string())
    }
}
