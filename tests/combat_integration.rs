//! Combat engine integration tests
//!
//! End-to-end fights driven through `Combat::tick` with a `RecordHost`.

use shinobi_duel::actions::catalog::{ESCAPE_GRAPPLE, GRAPPLER_PREFERENCE, STRIKE, STRUGGLE};
use shinobi_duel::ai::{combat_phase, score_action, AiProfile, ScoringContext};
use shinobi_duel::combat::{
    CombatEventKind, CombatSnapshot, Combatant, Tag, TagKind, TickOutcome,
};
use shinobi_duel::core::{CombatantId, Range, SequenceRng};
use shinobi_duel::records::load_opponents;
use shinobi_duel::{
    ActionCatalog, CharacterRecord, Combat, CombatConfig, CombatOutcome, CombatRng, CombatState,
    OpponentTemplate, RecordHost,
};

fn hero() -> CharacterRecord {
    CharacterRecord::new("Hero", 100.0, 100.0, 100.0)
}

/// Standard catalog with a much stronger Strike
fn heavy_strike_catalog() -> ActionCatalog {
    let standard = ActionCatalog::standard();
    let actions = standard.iter().cloned().map(|mut action| {
        if action.name == STRIKE {
            action.base_power = 50.0;
        }
        action
    });
    ActionCatalog::from_actions(actions).expect("catalog should stay valid")
}

#[test]
fn test_strike_kills_and_ends_once() {
    let mut config = CombatConfig::default();
    config.starting_range = Range::Engaged;

    let mut dummy = OpponentTemplate::new("Training Dummy", AiProfile::Brawler);
    dummy.max_health = 1.0;
    dummy.max_chakra = 0.0;
    dummy.max_stamina = 0.0;

    let mut host = RecordHost::new(hero()).with_script(&[STRIKE]);
    let mut combat = Combat::start(
        &hero(),
        &[dummy],
        heavy_strike_catalog(),
        config,
        CombatRng::seed_from_u64(1),
        &mut host,
    );

    let mut ended_at = None;
    for _ in 0..20 {
        if combat.tick(&mut host) == TickOutcome::Ended {
            ended_at = Some(combat.state().tick);
        }
    }

    assert_eq!(ended_at, Some(7), "player should act and win on the first full gauge");
    assert_eq!(host.endings, vec![true]);
    assert_eq!(combat.outcome(), CombatOutcome::Victory);
    assert!(!combat.is_active());
    assert!(host.record.cexp > 0);
    let endings = host
        .events
        .iter()
        .filter(|e| matches!(e.kind, CombatEventKind::CombatEnded { .. }))
        .count();
    assert_eq!(endings, 1);
}

#[test]
fn test_burning_expiry_narrated_once() {
    let player = Combatant::new(CombatantId::PLAYER, "Hero", true);
    let mut foe = Combatant::new(CombatantId(1), "Foe", false);
    foe.tags.add(Tag::new(TagKind::Burning, 3).with_payload(4.0));
    let state = CombatState::new(vec![player, foe], Range::Long);
    let mut combat = Combat::new(
        state,
        ActionCatalog::standard(),
        CombatConfig::default(),
        SequenceRng::constant(0.99),
    );
    let mut host = RecordHost::new(hero());

    for _ in 0..12 {
        combat.tick(&mut host);
    }

    let expiries = host
        .events
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                CombatEventKind::TagExpired {
                    kind: TagKind::Burning,
                    ..
                }
            )
        })
        .count();
    let burns = host
        .events
        .iter()
        .filter(|e| matches!(e.kind, CombatEventKind::TagDamage { kind: TagKind::Burning, .. }))
        .count();
    assert_eq!(expiries, 1);
    assert_eq!(burns, 3);
    assert!(!combat.state().combatants[1].has_tag(TagKind::Burning));
}

#[test]
fn test_assassin_prefers_deception_over_brawler() {
    let catalog = ActionCatalog::standard();
    let config = CombatConfig::default();
    let mut assassin = Combatant::new(CombatantId(1), "Assassin", false);
    assassin.ai_profile = Some(AiProfile::Assassin);
    let mut brawler = Combatant::new(CombatantId(2), "Brawler", false);
    brawler.ai_profile = Some(AiProfile::Brawler);
    let player = Combatant::new(CombatantId::PLAYER, "Hero", true);
    let state = CombatState::new(vec![player, assassin, brawler], Range::Mid);

    let shuriken = catalog.get("Shadow Shuriken").expect("standard technique");
    let score_for = |index: usize| {
        let ctx = ScoringContext {
            actor: &state.combatants[index],
            target: state.combatants.first(),
            phase: combat_phase(&state),
            range: Range::Mid,
            config: &config,
        };
        score_action(shuriken, &ctx)
    };
    assert!(score_for(1) > score_for(2));
}

#[test]
fn test_grapple_is_exclusive() {
    let player = Combatant::new(CombatantId::PLAYER, "Hero", true);
    let mut grappler = Combatant::new(CombatantId(1), "Grappler", false);
    grappler.ai_profile = Some(AiProfile::Brawler);
    let mut bystander = Combatant::new(CombatantId(2), "Bystander", false);
    bystander.attributes.agility = 90.0;
    let mut state = CombatState::new(vec![player, grappler, bystander], Range::Engaged);
    state.combatants[0].tags.add(
        Tag::new(TagKind::Grappled, shinobi_duel::combat::tags::UNTIL_CLEARED)
            .from_source(CombatantId(1)),
    );

    // High rolls: every escape contest fails and nobody reacts
    let mut combat = Combat::new(
        state,
        ActionCatalog::standard(),
        CombatConfig::default(),
        SequenceRng::constant(0.99),
    );
    let mut host = RecordHost::new(hero());

    let mut seen = 0;
    for _ in 0..40 {
        let was_grappled = combat.state().combatants[0].is_grappled();
        let outcome = combat.tick(&mut host);
        let history = &combat.state().jutsu_history;
        for record in &history[seen..] {
            assert!(was_grappled, "hold should last the whole test");
            match record.actor {
                CombatantId::PLAYER => assert_eq!(record.name, ESCAPE_GRAPPLE),
                CombatantId(1) => assert!(
                    GRAPPLER_PREFERENCE.contains(&record.name.as_str()) || record.name == STRUGGLE,
                    "grappler used {}",
                    record.name
                ),
                other => panic!("{} acted during a grapple", other),
            }
        }
        seen = history.len();
        if outcome == TickOutcome::Ended {
            break;
        }
    }
    assert!(seen > 0, "someone in the hold should have acted");
}

#[test]
fn test_one_resolution_per_tick() {
    let roster = load_opponents("data/opponents.toml").expect("shipped roster");
    let mut host = RecordHost::new(hero());
    let mut combat = Combat::start(
        &hero(),
        &roster[..1],
        ActionCatalog::standard(),
        CombatConfig::default(),
        CombatRng::seed_from_u64(11),
        &mut host,
    );

    let mut seen = 0;
    for _ in 0..600 {
        let active = combat.is_active();
        let outcome = combat.tick(&mut host);
        let added = combat.state().jutsu_history.len() - seen;
        seen = combat.state().jutsu_history.len();
        assert!(added <= 1, "{} actions in one tick", added);
        if !active {
            assert_eq!(outcome, TickOutcome::Inactive);
            assert_eq!(added, 0);
        }
    }
    assert!(host.endings.len() <= 1);
}

#[test]
fn test_snapshot_resumes_identically() {
    let roster = load_opponents("data/opponents.toml").expect("shipped roster");
    let mut host = RecordHost::new(hero());
    let mut combat = Combat::start(
        &hero(),
        &roster[2..3],
        ActionCatalog::standard(),
        CombatConfig::default(),
        CombatRng::seed_from_u64(42),
        &mut host,
    );
    for _ in 0..15 {
        combat.tick(&mut host);
    }

    let json = combat.snapshot().to_json().expect("snapshot serializes");
    let mark = host.events.len();
    for _ in 0..200 {
        combat.tick(&mut host);
    }
    let original: Vec<_> = host.events[mark..].to_vec();

    let snapshot: CombatSnapshot<CombatRng> =
        CombatSnapshot::from_json(&json).expect("snapshot deserializes");
    let mut resumed = Combat::restore(snapshot, ActionCatalog::standard(), CombatConfig::default());
    let mut replay_host = RecordHost::new(hero());
    for _ in 0..200 {
        resumed.tick(&mut replay_host);
    }

    assert_eq!(original, replay_host.events);
    assert_eq!(combat.state(), resumed.state());
}

#[test]
fn test_seeded_fight_finishes() {
    let roster = load_opponents("data/opponents.toml").expect("shipped roster");
    for (seed, opponent) in roster.iter().enumerate() {
        let mut host = RecordHost::new(hero());
        let mut combat = Combat::start(
            &hero(),
            std::slice::from_ref(opponent),
            ActionCatalog::standard(),
            CombatConfig::default(),
            CombatRng::seed_from_u64(seed as u64),
            &mut host,
        );
        let outcome = combat.run_until_finished(&mut host, 5000);
        assert_ne!(outcome, CombatOutcome::Undecided, "{} never finished", opponent.name);
        assert_eq!(host.endings.len(), 1);
    }
}
