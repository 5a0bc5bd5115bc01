//! Headless Duel Runner
//!
//! Runs a full fight between a scripted-default player and a roster
//! opponent and prints the result as JSON or text.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use shinobi_duel::combat::skill::Skill;
use shinobi_duel::core::load_config;
use shinobi_duel::records::load_opponents;
use shinobi_duel::{
    ActionCatalog, CharacterRecord, Combat, CombatConfig, CombatError, CombatRng, RecordHost,
    Result,
};

/// Headless Duel Runner - play out a fight with a fixed seed
#[derive(Parser, Debug)]
#[command(name = "duel_runner")]
#[command(about = "Run a headless shinobi duel and report the outcome")]
struct Args {
    /// Opponent name from the roster (defaults to the first entry)
    #[arg(long)]
    opponent: Option<String>,

    /// Opponent roster file
    #[arg(long, default_value = "data/opponents.toml")]
    roster: PathBuf,

    /// Combat tuning file; built-in defaults when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Action catalog file; built-in catalog when absent
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Player record as JSON; a default genin when absent
    #[arg(long)]
    player: Option<PathBuf>,

    /// Maximum ticks before giving up
    #[arg(long, default_value_t = 2000)]
    max_ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every narrative event as it happens
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct DuelResult {
    outcome: String,
    ticks: u64,
    opponent: String,
    player_health: f32,
    opponent_health: f32,
    events: usize,
    cexp: u32,
    injuries: Vec<String>,
    seed: u64,
}

fn default_player() -> CharacterRecord {
    let mut record = CharacterRecord::new("Leaf Genin", 100.0, 100.0, 100.0);
    record.skills.set(Skill::Taijutsu, 15);
    record.skills.set(Skill::Ninjutsu, 20);
    record.skills.set(Skill::Shurikenjutsu, 10);
    record.skills.set(Skill::HandSeals, 25);
    record.skills.set(Skill::ChakraControl, 20);
    for (technique, level) in [
        ("Fireball Jutsu", 3),
        ("Clone Jutsu", 2),
        ("Substitution Jutsu", 1),
        ("Water Wall", 1),
    ] {
        record.techniques.insert(technique.to_string(), level);
    }
    record.inventory.insert("Kunai".to_string(), 3);
    record.inventory.insert("Shuriken".to_string(), 10);
    record
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => CombatConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => ActionCatalog::load(path)?,
        None => ActionCatalog::standard(),
    };
    let player = match &args.player {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => default_player(),
    };

    let roster = load_opponents(&args.roster)?;
    let opponent = match &args.opponent {
        Some(name) => roster
            .iter()
            .find(|o| &o.name == name)
            .cloned()
            .ok_or_else(|| CombatError::InvalidConfig(format!("no opponent named '{}'", name)))?,
        None => roster
            .first()
            .cloned()
            .ok_or_else(|| CombatError::InvalidConfig("opponent roster is empty".into()))?,
    };
    tracing::info!(seed, opponent = %opponent.name, "starting duel");

    let mut host = RecordHost::new(player.clone());
    if args.verbose {
        host = host.with_echo();
    }
    let mut combat = Combat::start(
        &player,
        std::slice::from_ref(&opponent),
        catalog,
        config,
        CombatRng::seed_from_u64(seed),
        &mut host,
    );
    let outcome = combat.run_until_finished(&mut host, args.max_ticks);

    let state = combat.state();
    let result = DuelResult {
        outcome: format!("{:?}", outcome),
        ticks: state.tick,
        opponent: opponent.name.clone(),
        player_health: host.record.health,
        opponent_health: state
            .combatants
            .get(1)
            .map_or(0.0, |c| c.vitals.health),
        events: host.events.len(),
        cexp: host.record.cexp,
        injuries: host.record.injuries.clone(),
        seed,
    };

    match args.format.as_str() {
        "text" => {
            println!("Duel Result");
            println!("===========");
            println!("Outcome: {}", result.outcome);
            println!("Ticks: {}", result.ticks);
            println!("Opponent: {} ({:.0} health left)", result.opponent, result.opponent_health);
            println!("Player health: {:.0}", result.player_health);
            println!("Events: {}", result.events);
            println!("CEXP: {}", result.cexp);
            if !result.injuries.is_empty() {
                println!("Injuries: {}", result.injuries.join(", "));
            }
            println!("Seed: {}", result.seed);
        }
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}
