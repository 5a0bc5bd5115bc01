//! Combat lifecycle - start, end, forfeit and rewards

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actions::catalog::{ActionCatalog, ANALYZE};
use crate::actions::effect::Category;
use crate::combat::combatant::{Attribute, Combatant};
use crate::combat::context::TurnContext;
use crate::combat::events::{CombatEventKind, Severity};
use crate::combat::host::CombatHost;
use crate::combat::scheduler::Combat;
use crate::combat::skill::Skill;
use crate::combat::state::{CombatOutcome, CombatState};
use crate::core::config::CombatConfig;
use crate::core::rng::RandomSource;
use crate::core::types::CombatantId;
use crate::records::{CharacterRecord, OpponentTemplate};

/// Injury recorded on a lost or abandoned fight
pub const BATTLE_EXHAUSTION: &str = "battle_exhaustion";

/// Skill experience per use of a technique in that skill
pub const SKILL_XP_PER_USE: u32 = 10;

/// Attribute growth for practising a discipline during a won fight
pub const ATTRIBUTE_GAIN: f32 = 0.5;

/// Progression granted for a victory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rewards {
    /// Combat experience
    pub cexp: u32,
    pub skill_xp: BTreeMap<Skill, u32>,
    pub attribute_gains: BTreeMap<Attribute, f32>,
    /// Keyed by opponent name
    pub familiarity: BTreeMap<String, u32>,
}

impl Rewards {
    pub fn is_empty(&self) -> bool {
        self.cexp == 0
            && self.skill_xp.is_empty()
            && self.attribute_gains.is_empty()
            && self.familiarity.is_empty()
    }
}

/// Rewards for the player from a finished fight
pub fn compute_rewards(state: &CombatState, catalog: &ActionCatalog, config: &CombatConfig) -> Rewards {
    let mut rewards = Rewards::default();
    let Some(player) = state.player() else {
        return rewards;
    };

    for foe in state.combatants.iter().filter(|c| !c.is_player && !c.is_alive()) {
        rewards.cexp += config.cexp_per_opponent + (foe.vitals.max_health / 10.0) as u32;
    }

    let mut used = |attribute: Attribute| {
        rewards.attribute_gains.insert(attribute, ATTRIBUTE_GAIN);
    };
    let mut skill_uses: BTreeMap<Skill, u32> = BTreeMap::new();
    for record in state.jutsu_history.iter().filter(|r| r.actor == player.id) {
        let Some(action) = catalog.get(&record.name) else {
            continue;
        };
        if let Some(skill) = action.category.skill() {
            *skill_uses.entry(skill).or_default() += 1;
        }
        match action.category {
            Category::Taijutsu => {
                used(Attribute::Strength);
                used(Attribute::Agility);
            }
            Category::Ninjutsu | Category::Genjutsu => used(Attribute::Intellect),
            _ => {}
        }
        if action.name == ANALYZE {
            used(Attribute::Perception);
        }
    }
    rewards.skill_xp = skill_uses
        .into_iter()
        .map(|(skill, uses)| (skill, uses * SKILL_XP_PER_USE))
        .collect();

    for foe in state.combatants.iter().filter(|c| !c.is_player) {
        let familiarity = 1 + player.familiarity_with(foe.id);
        *rewards.familiarity.entry(foe.name.clone()).or_default() += familiarity;
    }
    rewards
}

/// Close the fight exactly once
///
/// Later calls are ignored, so the host sees a single ending whatever
/// triggered it.
pub(crate) fn end_combat(ctx: &mut TurnContext<'_>, outcome: CombatOutcome) {
    if !ctx.state.is_active {
        return;
    }
    ctx.state.is_active = false;
    ctx.state.outcome = outcome;
    let victory = outcome.is_victory();

    if let Some(player) = ctx.state.player() {
        let vitals = player.vitals;
        ctx.host.sync_vitals(&vitals);
    }

    if victory {
        let rewards = compute_rewards(ctx.state, ctx.catalog, ctx.config);
        tracing::info!(cexp = rewards.cexp, "awarding victory rewards");
        ctx.host.apply_rewards(&rewards);
    } else {
        ctx.host.apply_injury(BATTLE_EXHAUSTION);
    }

    let (message, severity) = match outcome {
        CombatOutcome::Victory => ("Victory! The last opponent falls.", Severity::Victory),
        CombatOutcome::Forfeit => ("You withdraw from the fight.", Severity::Defeat),
        CombatOutcome::Defeat | CombatOutcome::Undecided => ("Defeat...", Severity::Defeat),
    };
    ctx.emit(CombatEventKind::CombatEnded { victory }, message, severity);
    ctx.host.on_combat_end(victory);
    tracing::info!(tick = ctx.state.tick, ?outcome, "combat ended");
}

impl<R: RandomSource> Combat<R> {
    /// Build a fight from the player's record and opponent templates
    pub fn start(
        player: &CharacterRecord,
        opponents: &[OpponentTemplate],
        catalog: ActionCatalog,
        config: CombatConfig,
        rng: R,
        host: &mut dyn CombatHost,
    ) -> Self {
        let mut combatants = Vec::with_capacity(opponents.len() + 1);
        combatants.push(Combatant::from_record(player));
        combatants.extend(
            opponents
                .iter()
                .enumerate()
                .map(|(i, template)| Combatant::from_template(CombatantId(i as u32 + 1), template)),
        );
        let state = CombatState::new(combatants, config.starting_range);
        let mut combat = Self::new(state, catalog, config, rng);

        let names: Vec<&str> = opponents.iter().map(|o| o.name.as_str()).collect();
        let message = format!("{} faces {}!", player.name, names.join(" and "));
        tracing::info!(player = %player.name, opponents = ?names, "combat started");
        combat
            .context(host)
            .emit(CombatEventKind::CombatStarted, message, Severity::Info);
        combat
    }

    /// End the fight now with `outcome`; no-op once inactive
    pub fn end_combat(&mut self, host: &mut dyn CombatHost, outcome: CombatOutcome) {
        end_combat(&mut self.context(host), outcome);
    }

    /// The player walks away; counts as a defeat
    pub fn forfeit(&mut self, host: &mut dyn CombatHost) {
        self.end_combat(host, CombatOutcome::Forfeit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::profile::AiProfile;
    use crate::combat::host::RecordHost;
    use crate::combat::state::JutsuRecord;
    use crate::combat::tags::{Tag, TagKind, UNTIL_CLEARED};
    use crate::core::rng::SequenceRng;
    use crate::core::types::{Range, Rank};

    fn record() -> CharacterRecord {
        let mut record = CharacterRecord::new("Hero", 100.0, 100.0, 100.0);
        record.skills.set(Skill::Taijutsu, 5);
        record.skills.set(Skill::Ninjutsu, 5);
        record
    }

    fn start(host: &mut RecordHost) -> Combat<SequenceRng> {
        let foe = OpponentTemplate::new("Rogue", AiProfile::Brawler);
        Combat::start(
            &record(),
            &[foe],
            ActionCatalog::standard(),
            CombatConfig::default(),
            SequenceRng::constant(0.5),
            host,
        )
    }

    #[test]
    fn test_start_builds_state() {
        let mut host = RecordHost::new(record());
        let combat = start(&mut host);
        let state = combat.state();
        assert!(state.is_active);
        assert_eq!(state.combatants.len(), 2);
        assert!(state.combatants[0].is_player);
        assert_eq!(state.combatants[1].id, CombatantId(1));
        assert_eq!(state.range(), Range::Mid);
        assert!(matches!(host.events[0].kind, CombatEventKind::CombatStarted));
    }

    #[test]
    fn test_forfeit_ends_once_with_injury() {
        let mut host = RecordHost::new(record());
        let mut combat = start(&mut host);
        combat.forfeit(&mut host);
        combat.forfeit(&mut host);
        combat.end_combat(&mut host, CombatOutcome::Victory);
        assert_eq!(host.endings, vec![false]);
        assert_eq!(combat.outcome(), CombatOutcome::Forfeit);
        assert!(host.record.injuries.contains(&BATTLE_EXHAUSTION.to_string()));
    }

    #[test]
    fn test_victory_rewards() {
        let mut host = RecordHost::new(record());
        let mut combat = start(&mut host);
        let state = &mut combat.state;
        state.combatants[1].vitals.health = 0.0;
        for name in ["Strike", "Strike", "Fireball Jutsu", ANALYZE] {
            state.jutsu_history.push(JutsuRecord {
                tick: 1,
                actor: CombatantId::PLAYER,
                name: name.into(),
                rank: Rank::E,
            });
        }
        state.combatants[0].tags.add(
            Tag::new(TagKind::Analyzed, UNTIL_CLEARED)
                .from_source(CombatantId(1))
                .with_payload(2.0),
        );

        let rewards = compute_rewards(&combat.state, &combat.catalog, &combat.config);
        assert_eq!(rewards.cexp, 35);
        assert_eq!(rewards.skill_xp.get(&Skill::Taijutsu), Some(&20));
        assert_eq!(rewards.skill_xp.get(&Skill::Ninjutsu), Some(&10));
        assert_eq!(rewards.attribute_gains.get(&Attribute::Perception), Some(&0.5));
        assert_eq!(rewards.attribute_gains.get(&Attribute::Intellect), Some(&0.5));
        assert_eq!(rewards.familiarity.get("Rogue"), Some(&3));

        combat.end_combat(&mut host, CombatOutcome::Victory);
        assert_eq!(host.endings, vec![true]);
        assert_eq!(host.record.cexp, 35);
        assert!(host.record.injuries.is_empty());
    }

    #[test]
    fn test_defeat_gives_no_rewards() {
        let mut host = RecordHost::new(record());
        let mut combat = start(&mut host);
        combat.state.combatants[0].vitals.health = 0.0;
        combat.end_combat(&mut host, CombatOutcome::Defeat);
        assert_eq!(host.record.cexp, 0);
        assert_eq!(host.record.health, 0.0);
        assert_eq!(host.endings, vec![false]);
    }
}
