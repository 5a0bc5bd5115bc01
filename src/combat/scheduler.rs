//! Tick scheduler
//!
//! One call to [`Combat::tick`] advances the fight by one step:
//!
//! 1. tags count down (damage-over-time lands, expiries are narrated)
//! 2. disguise detection rolls
//! 3. terminal check
//! 4. casting countdowns; a completed cast resolves and ends the tick
//! 5. action gauges fill
//! 6. grapple preemption
//! 7. the readiest combatant takes a standard turn
//!
//! At most one action resolves per tick, and nothing happens once the
//! combat is inactive.

use serde::{Deserialize, Serialize};

use crate::actions::catalog::{ActionCatalog, ESCAPE_GRAPPLE, GRAPPLER_PREFERENCE, GUARD, STRUGGLE};
use crate::actions::usability::{is_usable, usable_actions};
use crate::ai::decision::decide;
use crate::combat::context::TurnContext;
use crate::combat::events::{CombatEventKind, Severity};
use crate::combat::host::CombatHost;
use crate::combat::lifecycle::end_combat;
use crate::combat::resolution::{after_damage, detects, resolve_action, resolve_cast};
use crate::combat::state::{CombatOutcome, CombatState};
use crate::combat::tags::TagKind;
use crate::core::config::CombatConfig;
use crate::core::error::Result;
use crate::core::rng::{CombatRng, RandomSource};
use crate::core::types::CombatantId;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Combat already over; nothing happened
    Inactive,
    /// Time passed but nobody acted
    Idle,
    /// A prepared technique went off
    CastResolved,
    /// A grapple participant acted out of turn
    GrapplePreempted,
    /// Someone took a standard turn
    TurnTaken,
    /// The fight finished this tick
    Ended,
}

impl TickOutcome {
    /// Did an action resolve this tick?
    pub fn resolved_action(&self) -> bool {
        matches!(
            self,
            TickOutcome::CastResolved | TickOutcome::GrapplePreempted | TickOutcome::TurnTaken
        )
    }
}

/// Serializable mid-fight state; resuming from it replays identically
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatSnapshot<R> {
    pub state: CombatState,
    pub rng: R,
}

/// A running fight
///
/// Owns its state and random source. The host is lent per call.
#[derive(Debug, Clone)]
pub struct Combat<R: RandomSource = CombatRng> {
    pub(crate) state: CombatState,
    pub(crate) catalog: ActionCatalog,
    pub(crate) config: CombatConfig,
    pub(crate) rng: R,
}

impl<R: RandomSource> Combat<R> {
    /// Wrap an already built state
    pub fn new(state: CombatState, catalog: ActionCatalog, config: CombatConfig, rng: R) -> Self {
        Self {
            state,
            catalog,
            config,
            rng,
        }
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    /// Direct access for hosts that stage scenarios before ticking
    pub fn state_mut(&mut self) -> &mut CombatState {
        &mut self.state
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn outcome(&self) -> CombatOutcome {
        self.state.outcome
    }

    /// Borrow everything a resolution step needs
    pub(crate) fn context<'a>(&'a mut self, host: &'a mut dyn CombatHost) -> TurnContext<'a> {
        TurnContext {
            state: &mut self.state,
            catalog: &self.catalog,
            config: &self.config,
            rng: &mut self.rng,
            host,
        }
    }

    /// Advance the fight by one tick
    pub fn tick(&mut self, host: &mut dyn CombatHost) -> TickOutcome {
        if !self.state.is_active {
            return TickOutcome::Inactive;
        }
        self.state.tick += 1;
        let mut ctx = self.context(host);

        advance_tags(&mut ctx);
        detect_disguises(&mut ctx);
        if let Some(outcome) = ctx.state.terminal_outcome() {
            end_combat(&mut ctx, outcome);
            return TickOutcome::Ended;
        }

        if advance_casts(&mut ctx) {
            return settle(&mut ctx, TickOutcome::CastResolved);
        }

        fill_gauges(&mut ctx);

        match grapple_preemption(&mut ctx) {
            Preemption::Acted => return settle(&mut ctx, TickOutcome::GrapplePreempted),
            Preemption::Waiting => return TickOutcome::Idle,
            Preemption::NoGrapple => {}
        }

        if take_turn(&mut ctx) {
            settle(&mut ctx, TickOutcome::TurnTaken)
        } else {
            TickOutcome::Idle
        }
    }

    /// Tick until the fight ends or `max_ticks` is reached
    pub fn run_until_finished(&mut self, host: &mut dyn CombatHost, max_ticks: u64) -> CombatOutcome {
        while self.state.is_active && self.state.tick < max_ticks {
            self.tick(host);
        }
        if self.state.is_active {
            tracing::warn!(tick = self.state.tick, "tick limit reached with combat still running");
        }
        self.state.outcome
    }
}

impl<R: RandomSource + Clone> Combat<R> {
    pub fn snapshot(&self) -> CombatSnapshot<R> {
        CombatSnapshot {
            state: self.state.clone(),
            rng: self.rng.clone(),
        }
    }

    /// Resume from a snapshot with the same catalog and config
    pub fn restore(snapshot: CombatSnapshot<R>, catalog: ActionCatalog, config: CombatConfig) -> Self {
        Self::new(snapshot.state, catalog, config, snapshot.rng)
    }
}

impl<R: RandomSource + Serialize> CombatSnapshot<R> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<R: RandomSource + for<'de> Deserialize<'de>> CombatSnapshot<R> {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Vitals write-back and terminal check after a resolution
fn settle(ctx: &mut TurnContext<'_>, outcome: TickOutcome) -> TickOutcome {
    if let Some(player) = ctx.state.player() {
        let vitals = player.vitals;
        ctx.host.sync_vitals(&vitals);
    }
    match ctx.state.terminal_outcome() {
        Some(terminal) => {
            end_combat(ctx, terminal);
            TickOutcome::Ended
        }
        None => outcome,
    }
}

fn advance_tags(ctx: &mut TurnContext<'_>) {
    for index in 0..ctx.state.combatants.len() {
        if !ctx.state.combatants[index].is_alive() {
            continue;
        }
        let c = &mut ctx.state.combatants[index];
        let dot_kind = c
            .tags
            .iter()
            .map(|t| t.kind)
            .find(TagKind::is_damage_over_time);
        let ticked = c.tags.advance();
        let id = c.id;
        let name = c.name.clone();

        if ticked.damage > 0.0 {
            let dealt = ctx.state.combatants[index].vitals.take_damage(ticked.damage.round());
            let kind = dot_kind.unwrap_or(TagKind::Burning);
            ctx.emit(
                CombatEventKind::TagDamage {
                    target: id,
                    kind,
                    damage: dealt,
                },
                format!("{} suffers {} damage from {:?}", name, dealt, kind),
                Severity::Hit,
            );
            after_damage(ctx, index);
        }

        for tag in ticked.expired {
            if tag.kind == TagKind::Grappled {
                ctx.emit(
                    CombatEventKind::GrappleReleased { actor: id },
                    format!("{} {}", name, tag.kind.expiry_message()),
                    Severity::Status,
                );
            } else {
                ctx.emit(
                    CombatEventKind::TagExpired {
                        owner: Some(id),
                        kind: tag.kind,
                    },
                    format!("{}: {}", name, tag.kind.expiry_message()),
                    Severity::Status,
                );
            }
        }
    }

    let ticked = ctx.state.battlefield.tags.advance();
    for tag in ticked.expired {
        ctx.emit(
            CombatEventKind::TagExpired {
                owner: None,
                kind: tag.kind,
            },
            capitalize(tag.kind.expiry_message()),
            Severity::Status,
        );
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn detect_disguises(ctx: &mut TurnContext<'_>) {
    let base = ctx.config.disguise_detection_base;
    let count = ctx.state.combatants.len();
    for disguised in 0..count {
        let target = &ctx.state.combatants[disguised];
        if !target.is_alive() || !target.has_tag(TagKind::Disguised) {
            continue;
        }
        for observer in 0..count {
            let (obs, dis) = (&ctx.state.combatants[observer], &ctx.state.combatants[disguised]);
            if observer == disguised || !obs.is_alive() || obs.is_player == dis.is_player {
                continue;
            }
            if detects(obs, dis, base, ctx.rng) {
                let (observer_id, disguised_id) = (obs.id, dis.id);
                let message = format!("{} sees through {}'s disguise!", obs.name, dis.name);
                ctx.state.combatants[disguised].tags.remove(TagKind::Disguised);
                ctx.emit(
                    CombatEventKind::DisguiseDetected {
                        disguised: disguised_id,
                        observer: observer_id,
                    },
                    message,
                    Severity::Status,
                );
                break;
            }
        }
    }
}

/// Count down casts; resolves the first one that completes
fn advance_casts(ctx: &mut TurnContext<'_>) -> bool {
    for index in 0..ctx.state.combatants.len() {
        let c = &mut ctx.state.combatants[index];
        if !c.is_alive() {
            continue;
        }
        let Some(cast) = c.casting.as_mut() else {
            continue;
        };
        cast.ticks_remaining = cast.ticks_remaining.saturating_sub(1);
        if cast.ticks_remaining > 0 {
            continue;
        }
        if let Some(cast) = c.casting.take() {
            resolve_cast(ctx, index, cast);
            return true;
        }
    }
    false
}

fn fill_gauges(ctx: &mut TurnContext<'_>) {
    let base = ctx.config.base_agility;
    for c in ctx.state.combatants.iter_mut() {
        if c.is_alive() && !c.is_casting() {
            c.action_gauge += c.gauge_gain(base);
        }
    }
}

enum Preemption {
    NoGrapple,
    /// A grapple is on but neither side is ready
    Waiting,
    Acted,
}

/// While a hold is on, only the two people in it act
fn grapple_preemption(ctx: &mut TurnContext<'_>) -> Preemption {
    let threshold = ctx.config.gauge_threshold;
    let Some(held) = ctx
        .state
        .combatants
        .iter()
        .position(|c| c.is_alive() && c.is_grappled())
    else {
        return Preemption::NoGrapple;
    };

    let holder = ctx.state.combatants[held]
        .tags
        .get(TagKind::Grappled)
        .and_then(|t| t.source)
        .and_then(|id| ctx.state.index_of(id))
        .filter(|i| ctx.state.combatants[*i].is_alive());
    let Some(holder) = holder else {
        let c = &mut ctx.state.combatants[held];
        c.tags.remove(TagKind::Grappled);
        let (id, name) = (c.id, c.name.clone());
        tracing::warn!(actor = %id, "dropping grapple with no living grappler");
        ctx.emit(
            CombatEventKind::GrappleReleased { actor: id },
            format!("{} {}", name, TagKind::Grappled.expiry_message()),
            Severity::Status,
        );
        return Preemption::NoGrapple;
    };

    let holder_id = ctx.state.combatants[holder].id;
    let held_id = ctx.state.combatants[held].id;

    if ctx.state.combatants[held].action_gauge >= threshold {
        ctx.state.combatants[held].action_gauge -= threshold;
        resolve_action(ctx, held, ESCAPE_GRAPPLE, Some(holder_id));
        return Preemption::Acted;
    }

    let grappler = &ctx.state.combatants[holder];
    if grappler.action_gauge >= threshold && !grappler.is_casting() {
        let catalog = ctx.catalog;
        let range = ctx.state.range();
        let action = GRAPPLER_PREFERENCE
            .iter()
            .copied()
            .find(|name| is_usable(grappler, catalog, name, range))
            .unwrap_or(STRUGGLE);
        ctx.state.combatants[holder].action_gauge -= threshold;
        resolve_action(ctx, holder, action, Some(held_id));
        return Preemption::Acted;
    }

    Preemption::Waiting
}

/// Standard turn for the readiest combatant; false if nobody is ready
fn take_turn(ctx: &mut TurnContext<'_>) -> bool {
    let threshold = ctx.config.gauge_threshold;
    let mut ready: Option<usize> = None;
    for (index, c) in ctx.state.combatants.iter().enumerate() {
        let eligible = c.is_alive()
            && !c.is_casting()
            && !c.has_tag(TagKind::Airborne)
            && !c.has_tag(TagKind::Grappled)
            && c.action_gauge >= threshold;
        if !eligible {
            continue;
        }
        // Strictly greater keeps the earliest index on ties
        if ready.map_or(true, |r| c.action_gauge > ctx.state.combatants[r].action_gauge) {
            ready = Some(index);
        }
    }
    let Some(actor) = ready else {
        return false;
    };
    ctx.state.combatants[actor].action_gauge -= threshold;

    let (action, target) = choose_action(ctx, actor);
    resolve_action(ctx, actor, &action, target);
    true
}

fn choose_action(ctx: &mut TurnContext<'_>, actor: usize) -> (String, Option<CombatantId>) {
    let catalog = ctx.catalog;
    let config = ctx.config;
    let state = &*ctx.state;
    let c = &state.combatants[actor];

    if !c.is_player {
        let decision = decide(actor, state, catalog, config, ctx.rng);
        tracing::debug!(actor = %c.id, action = %decision.action, reason = ?decision.reason, "ai decision");
        return (decision.action, decision.target);
    }

    let range = state.range();
    let target = state.default_target(c.id);
    let usable = usable_actions(c, catalog, range);
    let choice = ctx.host.choose_player_action(c, &usable, state);
    match choice {
        Some(name) if is_usable(c, catalog, &name, range) => (name, target),
        Some(name) => {
            tracing::warn!(action = %name, "player chose an unusable action; guarding");
            (GUARD.to_string(), target)
        }
        None => (GUARD.to_string(), target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::catalog::STRIKE;
    use crate::combat::combatant::{CastingState, Combatant};
    use crate::combat::host::RecordHost;
    use crate::combat::tags::{Tag, UNTIL_CLEARED};
    use crate::core::rng::SequenceRng;
    use crate::core::types::Range;
    use crate::records::CharacterRecord;

    fn duel(range: Range) -> Combat<SequenceRng> {
        let player = Combatant::new(CombatantId::PLAYER, "Hero", true);
        let foe = Combatant::new(CombatantId(1), "Foe", false);
        Combat::new(
            CombatState::new(vec![player, foe], range),
            ActionCatalog::standard(),
            CombatConfig::default(),
            SequenceRng::constant(0.99),
        )
    }

    fn host() -> RecordHost {
        RecordHost::new(CharacterRecord::new("Hero", 100.0, 100.0, 100.0))
    }

    #[test]
    fn test_inactive_tick_is_noop() {
        let mut combat = duel(Range::Mid);
        combat.state.is_active = false;
        let mut host = host();
        assert_eq!(combat.tick(&mut host), TickOutcome::Inactive);
        assert_eq!(combat.state.tick, 0);
        assert!(host.events.is_empty());
    }

    #[test]
    fn test_gauges_fill_until_someone_acts() {
        let mut combat = duel(Range::Engaged);
        let mut host = host();
        // agility 30 fills 15 per tick; 100 is reached on the seventh tick
        for _ in 0..6 {
            assert_eq!(combat.tick(&mut host), TickOutcome::Idle);
        }
        assert_eq!(combat.tick(&mut host), TickOutcome::TurnTaken);
        // Player wins the tie and acts first
        assert!(combat.state.combatants[0].action_gauge < 100.0);
        assert!(combat.state.combatants[1].action_gauge >= 100.0);
    }

    #[test]
    fn test_cast_resolution_consumes_tick() {
        let mut combat = duel(Range::Mid);
        combat.state.combatants[1].casting = Some(CastingState {
            action: "Fireball Jutsu".into(),
            target: CombatantId::PLAYER,
            ticks_remaining: 1,
        });
        combat.state.combatants[0].action_gauge = 150.0;
        let mut host = host();
        assert_eq!(combat.tick(&mut host), TickOutcome::CastResolved);
        assert!(combat.state.combatants[1].casting.is_none());
        // No gauge fill and no standard turn on a cast tick
        assert_eq!(combat.state.combatants[0].action_gauge, 150.0);
    }

    #[test]
    fn test_grappled_escape_preempts() {
        let mut combat = duel(Range::Engaged);
        combat.state.combatants[0]
            .tags
            .add(Tag::new(TagKind::Grappled, UNTIL_CLEARED).from_source(CombatantId(1)));
        combat.state.combatants[0].action_gauge = 100.0;
        combat.state.combatants[1].action_gauge = 200.0;
        let mut host = host();
        assert_eq!(combat.tick(&mut host), TickOutcome::GrapplePreempted);
        assert!(host
            .events
            .iter()
            .any(|e| matches!(&e.kind, CombatEventKind::ActionUsed { action, .. } if action == ESCAPE_GRAPPLE)));
        // The grappler did not also act
        assert!(combat.state.combatants[1].action_gauge >= 200.0);
    }

    #[test]
    fn test_dead_grappler_releases_hold() {
        let mut combat = duel(Range::Engaged);
        let third = Combatant::new(CombatantId(2), "Ally", false);
        combat.state.combatants.push(third);
        combat.state.combatants[1].vitals.health = 0.0;
        combat.state.combatants[0]
            .tags
            .add(Tag::new(TagKind::Grappled, UNTIL_CLEARED).from_source(CombatantId(1)));
        let mut host = host();
        combat.tick(&mut host);
        assert!(!combat.state.combatants[0].is_grappled());
        assert!(host
            .events
            .iter()
            .any(|e| matches!(e.kind, CombatEventKind::GrappleReleased { .. })));
    }

    #[test]
    fn test_player_unusable_choice_guards() {
        let mut combat = duel(Range::Long);
        combat.state.combatants[0].action_gauge = 100.0;
        let mut host = host().with_script(&[STRIKE]);
        assert_eq!(combat.tick(&mut host), TickOutcome::TurnTaken);
        assert_eq!(combat.state.combatants[0].recent_actions.back().map(String::as_str), Some(GUARD));
    }

    #[test]
    fn test_terminal_ends_once() {
        let mut combat = duel(Range::Mid);
        combat.state.combatants[1].vitals.health = 0.0;
        let mut host = host();
        assert_eq!(combat.tick(&mut host), TickOutcome::Ended);
        assert_eq!(combat.tick(&mut host), TickOutcome::Inactive);
        assert_eq!(host.endings, vec![true]);
        assert_eq!(combat.outcome(), CombatOutcome::Victory);
    }

    #[test]
    fn test_snapshot_round_trip_json() {
        let mut combat = Combat::new(
            CombatState::new(
                vec![
                    Combatant::new(CombatantId::PLAYER, "Hero", true),
                    Combatant::new(CombatantId(1), "Foe", false),
                ],
                Range::Mid,
            ),
            ActionCatalog::standard(),
            CombatConfig::default(),
            CombatRng::seed_from_u64(7),
        );
        let mut host = host();
        for _ in 0..20 {
            combat.tick(&mut host);
        }
        let json = combat.snapshot().to_json().unwrap();
        let snapshot: CombatSnapshot<CombatRng> = CombatSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot.state, combat.state);
        assert_eq!(snapshot.rng, combat.rng);
    }
}
