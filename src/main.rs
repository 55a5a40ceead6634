//! Statecraft - Scenario Driver
//!
//! Registers a set of countries, feeds a seeded stream of diplomatic
//! commands and opinion modifiers through the command executor, runs the
//! monthly decay, then saves, reloads and verifies the relationship store.

use std::path::PathBuf;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use statecraft::command::{CommandExecutor, DiplomacyCommand};
use statecraft::core::error::{DiplomacyError, Result};
use statecraft::core::types::{CountryId, Tick};
use statecraft::core::DiplomacyConfig;
use statecraft::diplomacy::persistence;
use statecraft::diplomacy::{
    CountryRegistry, DiplomacyStats, DiplomacySystem, EventLog, OpinionModifier, RelationshipStore,
    SimulationClock, TickSource, PERMANENT,
};
use statecraft::math::Fixed64;

/// Statecraft - deterministic diplomacy simulation
#[derive(Parser, Debug)]
#[command(name = "statecraft")]
#[command(about = "Drive the diplomacy subsystem through a seeded scenario")]
struct Args {
    /// Number of countries to register
    #[arg(long, default_value_t = 32)]
    countries: u16,

    /// Simulated months to run
    #[arg(long, default_value_t = 24)]
    months: u32,

    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Opinion modifiers applied at the start of each month
    #[arg(long, default_value_t = 64)]
    modifiers_per_month: u32,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the final store here (and verify by reloading it)
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    seed: u64,
    months: u32,
    final_tick: Tick,
    commands_executed: usize,
    commands_rejected: usize,
    modifiers_applied: usize,
    modifiers_decayed: usize,
    orphans_reclaimed: usize,
    events: usize,
    stats: Option<DiplomacyStats>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("statecraft=info")),
        )
        .init();

    let args = Args::parse();
    if args.countries < 2 {
        return Err(DiplomacyError::Config(format!(
            "at least two countries are required, got {}",
            args.countries
        )));
    }

    let config = match &args.config {
        Some(path) => DiplomacyConfig::load(path)?,
        None => DiplomacyConfig::default(),
    };
    tracing::info!("Statecraft starting (seed {}, {} countries)", args.seed, args.countries);

    let registry = CountryRegistry::with_count(args.countries);
    let mut system = DiplomacySystem::new(config.clone());
    let mut log = EventLog::new();
    system.initialize(&registry, &mut log);

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut clock = SimulationClock::new(0);
    let mut summary = Summary {
        seed: args.seed,
        months: args.months,
        ..Summary::default()
    };
    let commands_per_month = (args.countries as usize / 2).max(1);

    for _ in 0..args.months {
        let tick = clock.current_tick();

        for _ in 0..commands_per_month {
            let command = random_command(&mut rng, args.countries);
            let result = CommandExecutor::execute(&mut system.store, &registry, &command, tick, &mut log);
            if result.executed {
                summary.commands_executed += 1;
            } else {
                summary.commands_rejected += 1;
            }
        }

        for _ in 0..args.modifiers_per_month {
            let (a, b) = random_pair(&mut rng, args.countries);
            system
                .store
                .add_opinion_modifier(a, b, random_modifier(&mut rng, tick), tick, &mut log)?;
            summary.modifiers_applied += 1;
        }

        for _ in 0..config.ticks_per_month {
            let tick = clock.advance();
            if let Some(report) = system.on_tick(tick) {
                summary.modifiers_decayed += report.decayed;
                summary.orphans_reclaimed += report.orphans_reclaimed;
            }
        }
    }

    summary.final_tick = clock.current_tick();
    summary.events = log.len();

    let reloaded = match &args.save {
        Some(path) => {
            system.save_to_file(path)?;
            persistence::load_from_file(path, &config)?
        }
        None => persistence::load(&system.to_bytes(), &config)?,
    };
    verify_round_trip(&system.store, &reloaded, &registry.ids(), summary.final_tick)?;
    tracing::info!("Round trip verified for {} relationships", reloaded.relationship_count());

    summary.stats = Some(system.store.stats());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn random_pair(rng: &mut ChaCha8Rng, countries: u16) -> (CountryId, CountryId) {
    let a = rng.gen_range(1..=countries);
    let mut b = rng.gen_range(1..countries);
    if b >= a {
        b += 1;
    }
    (CountryId(a), CountryId(b))
}

fn random_command(rng: &mut ChaCha8Rng, countries: u16) -> DiplomacyCommand {
    let (a, b) = random_pair(rng, countries);
    match rng.gen_range(0..10) {
        0 | 1 => DiplomacyCommand::DeclareWar { attacker: a, defender: b },
        2 | 3 => DiplomacyCommand::MakePeace { a, b },
        4 => DiplomacyCommand::FormAlliance { a, b },
        5 => DiplomacyCommand::BreakAlliance { a, b },
        6 => DiplomacyCommand::FormNonAggressionPact { a, b },
        7 => DiplomacyCommand::GuaranteeIndependence { guarantor: a, guaranteed: b },
        8 => DiplomacyCommand::GrantMilitaryAccess { granter: a, recipient: b },
        _ => DiplomacyCommand::RevokeMilitaryAccess { granter: a, recipient: b },
    }
}

fn random_modifier(rng: &mut ChaCha8Rng, tick: Tick) -> OpinionModifier {
    let modifier_type = rng.gen_range(1..=8);
    let value = Fixed64::from_int(rng.gen_range(-50..=50));
    let lifetime = if rng.gen_bool(0.05) {
        PERMANENT
    } else {
        rng.gen_range(30..=720)
    };
    OpinionModifier::new(modifier_type, value, tick, lifetime)
}

fn verify_round_trip(
    original: &RelationshipStore,
    reloaded: &RelationshipStore,
    countries: &[CountryId],
    tick: Tick,
) -> Result<()> {
    if persistence::to_bytes(original) != persistence::to_bytes(reloaded) {
        return Err(DiplomacyError::RoundTripMismatch("serialized bytes differ".to_string()));
    }
    for (i, &a) in countries.iter().enumerate() {
        for &b in &countries[i + 1..] {
            let same = original.get_opinion(a, b, tick) == reloaded.get_opinion(a, b, tick)
                && original.is_at_war(a, b) == reloaded.is_at_war(a, b)
                && original.get_treaty_flags(a, b) == reloaded.get_treaty_flags(a, b);
            if !same {
                return Err(DiplomacyError::RoundTripMismatch(format!("pair ({}, {})", a, b)));
            }
        }
        if original.get_enemies(a) != reloaded.get_enemies(a) {
            return Err(DiplomacyError::RoundTripMismatch(format!("enemies of {}", a)));
        }
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("\n=== STATECRAFT ===");
    println!("Seed:               {}", summary.seed);
    println!("Months simulated:   {} (final tick {})", summary.months, summary.final_tick);
    println!(
        "Commands:           {} executed, {} rejected",
        summary.commands_executed, summary.commands_rejected
    );
    println!(
        "Modifiers:          {} applied, {} decayed, {} orphans reclaimed",
        summary.modifiers_applied, summary.modifiers_decayed, summary.orphans_reclaimed
    );
    println!("Events emitted:     {}", summary.events);
    if let Some(stats) = &summary.stats {
        println!("Relationships:      {}", stats.relationships);
        println!("Active wars:        {}", stats.active_wars);
        println!("Alliances:          {}", stats.alliances);
        println!("Live modifiers:     {}", stats.modifiers);
    }
}
