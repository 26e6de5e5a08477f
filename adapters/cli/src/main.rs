#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the lockstep simulation worker.
//!
//! ```bash
//! # Run the worker for five seconds, spawning entities from seed 42
//! lockstep run --seconds 5 --spawn-seed 42
//!
//! # Reproduce a single draw from the deterministic generator
//! lockstep random --min 0 --max 10 --seed 12345 --frame 0
//! ```

mod config;
mod spawner;

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lockstep_core::{Message, SyncConfig};
use lockstep_math::{rng, trig, Fixed};
use lockstep_system_sync::{worker::SimulationWorker, ClockFactory};
use lockstep_world::SimulationClock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::SpawnerConfig, spawner::SeededSpawner};

const DEFAULT_LOG_FILTER: &str = "warn,lockstep=info";

/// Deterministic lockstep simulation toolkit.
#[derive(Debug, Parser)]
#[command(name = "lockstep", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the simulation worker and print every snapshot it publishes.
    Run(RunArgs),
    /// Draw one value from the deterministic random generator.
    Random(RandomArgs),
    /// Evaluate table-driven sine and cosine for an angle in degrees.
    Trig {
        /// Angle in degrees.
        #[arg(long, allow_hyphen_values = true)]
        degrees: f64,
    },
    /// Compute the angle of a vector in degrees.
    Atan2 {
        /// Vertical component.
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        /// Horizontal component.
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Wall-clock seconds to keep the simulation running.
    #[arg(long, default_value_t = 3.0)]
    seconds: f64,

    /// TOML file with `[simulation]` and `[spawner]` tables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the entity spawner; overrides the config file.
    #[arg(long, allow_hyphen_values = true)]
    spawn_seed: Option<i32>,
}

#[derive(Debug, Args)]
struct RandomArgs {
    /// Inclusive lower bound.
    #[arg(long, allow_hyphen_values = true)]
    min: i32,
    /// Exclusive upper bound.
    #[arg(long, allow_hyphen_values = true)]
    max: i32,
    /// Generator seed.
    #[arg(long, allow_hyphen_values = true)]
    seed: i32,
    /// Frame number mixed into the draw.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    frame: i32,
}

/// Entry point for the lockstep command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(&args),
        Command::Random(args) => {
            println!("{}", rng::random(args.min, args.max, args.seed, args.frame));
            Ok(())
        }
        Command::Trig { degrees } => {
            let angle = Fixed::from_float(degrees);
            let table = trig::ensure_ready();
            let sin = table.sin(angle);
            let cos = table.cos(angle);
            println!("sin({angle}) = {sin} (raw {})", sin.raw());
            println!("cos({angle}) = {cos} (raw {})", cos.raw());
            Ok(())
        }
        Command::Atan2 { y, x } => {
            let angle = trig::atan2(Fixed::from_float(y), Fixed::from_float(x));
            println!("{angle} (raw {})", angle.raw());
            Ok(())
        }
    }
}

fn run(args: &RunArgs) -> Result<()> {
    if !(args.seconds.is_finite() && args.seconds >= 0.0) {
        bail!("--seconds must be a non-negative number, got {}", args.seconds);
    }

    let config = config::load(args.config.as_deref())?;
    let spawner = args
        .spawn_seed
        .map(SpawnerConfig::with_seed)
        .or(config.spawner);
    let sync = config.simulation;

    trig::initialize();
    rng::initialize();

    let factory: ClockFactory = Box::new(move |sync_config: &SyncConfig| {
        let mut clock = SimulationClock::new(sync_config);
        if let Some(spawner) = spawner {
            clock.register(Box::new(SeededSpawner::new(spawner)));
        }
        clock
    });
    let worker =
        SimulationWorker::spawn_with(sync, factory).context("failed to start simulation worker")?;

    info!(
        seconds = args.seconds,
        tick_rate = sync.logic_tick_rate,
        spawner = spawner.is_some(),
        "running simulation"
    );
    worker.post(&Message::Init)?;

    let deadline = Instant::now() + Duration::from_secs_f64(args.seconds);
    let mut snapshots = 0_u64;
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        if let Some(Message::SyncState(snapshot)) = worker.recv_timeout(remaining)? {
            snapshots += 1;
            println!(
                "tick {:>6}  entities {:>6}  accumulator {:>7.3}ms  alpha {:.3}",
                snapshot.tick(),
                snapshot.state().entities().len(),
                snapshot.accumulator_ms(),
                snapshot.interpolation_alpha(sync.step_time_ms()),
            );
        }
    }

    worker.post(&Message::Stop)?;
    worker.shutdown()?;
    info!(snapshots, "simulation finished");
    Ok(())
}
