#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for the Swarm Waves scheduler.
//!
//! Runs the wave controller against a seeded stand-in for the combat
//! collaborator and prints one line per cleared wave.

mod config;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::simulation::{Driver, Simulation, WaveSummary};

#[derive(Debug, Parser)]
#[command(name = "swarm-waves", about = "Simulates the wave progression headlessly")]
struct Cli {
    /// TOML file overriding the default wave configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of waves to clear before stopping.
    #[arg(short, long, default_value_t = 10)]
    waves: u32,
    /// Wave the progression starts from.
    #[arg(long)]
    start_wave: Option<u32>,
    /// Maximum number of simultaneously materialized entities.
    #[arg(long)]
    active_cap: Option<u32>,
    /// Global seed for placement and reserve shuffling.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated frame length in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Hits the stand-in combat collaborator lands per frame.
    #[arg(long, default_value_t = 8)]
    hits_per_tick: u32,
    /// Damage dealt by each hit.
    #[arg(long, default_value_t = 120.0)]
    damage: f32,
    /// Prints the wave summaries and final debug snapshot as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    waves: &'a [WaveSummary],
    snapshot: swarm_waves_core::DebugSnapshot,
}

/// Entry point for the Swarm Waves command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut wave_config = config::load(cli.config.as_deref())?;
    if let Some(start_wave) = cli.start_wave {
        wave_config.starting_wave = start_wave;
    }
    if let Some(active_cap) = cli.active_cap {
        wave_config.active_cap = active_cap;
    }
    if let Some(seed) = cli.seed {
        wave_config.rng_seed = seed;
    }
    config::validate(&wave_config).context("invalid command-line overrides")?;

    let driver = Driver {
        waves: cli.waves,
        tick: Duration::from_millis(cli.tick_ms.max(1)),
        hits_per_tick: cli.hits_per_tick.max(1),
        damage_per_hit: cli.damage.max(1.0),
        seed: wave_config.rng_seed,
    };
    let mut simulation = Simulation::new(wave_config, driver)?;
    let waves = simulation.run()?.to_vec();

    let snapshot = simulation.controller().debug_snapshot();
    let pool = &snapshot.pool;
    tracing::info!(
        created = pool.created,
        reused = pool.reused,
        hit_rate = pool.hit_rate().unwrap_or(0.0),
        growth_events = pool.growth_events,
        "pool statistics"
    );

    if cli.json {
        let report = Report {
            waves: &waves,
            snapshot,
        };
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialize run report")?;
        println!("{json}");
    } else {
        for summary in &waves {
            println!(
                "wave {}: {} eliminated in {} ticks (peak {} live)",
                summary.wave, summary.total_target, summary.ticks, summary.peak_live
            );
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
