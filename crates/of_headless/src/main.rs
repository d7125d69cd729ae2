//! Headless OpenFields runner.
//!
//! Runs combat scenarios without graphics for CI testing, balance
//! sweeps, and seed-replay debugging.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in skirmish
//! cargo run -p of_headless -- run
//!
//! # Run a scenario file with a seed override
//! cargo run -p of_headless -- run --scenario scenarios/duel.ron --seed 7
//!
//! # Validate a scenario's data files without running it
//! cargo run -p of_headless -- validate --scenario scenarios/duel.ron
//! ```
//!
//! Exit codes: 0 on a normal run, non-zero when loading fails.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use of_headless::runner::{run_scenario, StopReason};
use of_headless::scenario::Scenario;

#[derive(Parser)]
#[command(name = "of_headless", about = "Headless OpenFields combat runner")]
struct Cli {
    /// Rendering/platform backend to report to the core (informational).
    #[arg(long, default_value = "console")]
    backend: String,

    /// Suppress the per-tick combat log.
    #[arg(long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario to completion.
    Run {
        /// Scenario file (RON); the built-in skirmish when omitted.
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Override the scenario's RNG seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Override the scenario's tick budget.
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Load and validate a scenario without running it.
    Validate {
        /// Scenario file (RON).
        #[arg(long)]
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(backend = %cli.backend, "backend selected");

    match cli.command {
        Commands::Run {
            scenario,
            seed,
            ticks,
        } => run(scenario, seed, ticks),
        Commands::Validate { scenario } => validate(scenario),
    }
}

fn load(path: Option<PathBuf>) -> Result<(Scenario, PathBuf), String> {
    match path {
        Some(path) => Scenario::load(&path).map_err(|e| e.to_string()),
        None => Ok((Scenario::default(), PathBuf::from("."))),
    }
}

fn run(path: Option<PathBuf>, seed: Option<u64>, ticks: Option<u64>) -> ExitCode {
    let (mut scenario, base_dir) = match load(path) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("failed to load scenario: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(seed) = seed {
        scenario.seed = seed;
    }
    if let Some(ticks) = ticks {
        scenario.ticks = ticks;
    }

    let (mut gs, spawned) = match scenario.build(&base_dir) {
        Ok(built) => built,
        Err(err) => {
            eprintln!("failed to build scenario: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "{}: {} units, seed {}, up to {} ticks",
        scenario.name,
        spawned.len(),
        scenario.seed,
        scenario.ticks
    );

    let outcome = run_scenario(&scenario, &mut gs);
    for line in &outcome.log {
        println!("  {line}");
    }
    match outcome.stop_reason {
        StopReason::Decided => match outcome.winner() {
            Some(faction) => println!(
                "decided after {} ticks: faction {} holds the field",
                outcome.ticks_run, faction
            ),
            None => println!("mutual destruction after {} ticks", outcome.ticks_run),
        },
        StopReason::TickBudget => {
            println!("undecided after {} ticks", outcome.ticks_run);
        }
    }
    ExitCode::SUCCESS
}

fn validate(path: PathBuf) -> ExitCode {
    let (scenario, base_dir) = match Scenario::load(&path) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("failed to load scenario: {err}");
            return ExitCode::FAILURE;
        }
    };
    match scenario.build(&base_dir) {
        Ok((gs, spawned)) => {
            println!(
                "{} OK: {} weapons, {} units",
                scenario.name,
                gs.weapons.len(),
                spawned.len()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("scenario data invalid: {err}");
            ExitCode::FAILURE
        }
    }
}
