//! # STRIDER Simulator Binary
//!
//! Runs a scripted scenario against a simulated motor and prints a JSON
//! report.
//!
//! # Usage
//!
//! ```bash
//! # Run as fast as possible
//! strider_sim --config config/scenario.toml
//!
//! # Pace ticks in wall-clock time (Ctrl-C stops early)
//! strider_sim --config config/scenario.toml --realtime
//!
//! # Verbose, JSON logs
//! strider_sim -c config/scenario.toml -v --json
//! ```
//!
//! Exits with status 2 if the motor hit a physical limit.

#![deny(warnings)]

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use strider_common::config::{ConfigError, ConfigLoader};
use strider_common::consts::DEFAULT_SCENARIO_CONFIG;
use strider_hal::scenario::{ScenarioConfig, ScenarioReport, ScenarioRunner};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// STRIDER simulator - runs a motor scenario and reports the outcome
#[derive(Parser, Debug)]
#[command(name = "strider_sim")]
#[command(version)]
#[command(about = "Simulated motor scenario runner")]
#[command(long_about = None)]
struct Args {
    /// Path to the scenario file.
    #[arg(short, long, default_value = DEFAULT_SCENARIO_CONFIG)]
    config: PathBuf,

    /// Sleep one tick between periodic calls
    #[arg(short, long)]
    realtime: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = ScenarioConfig::load(&args.config);

    let level = match (&config, args.verbose) {
        (_, true) => Level::DEBUG,
        (Ok(config), false) => config.shared.log_level.into(),
        (Err(_), false) => Level::INFO,
    };
    setup_tracing(level, args.json);

    match run(&args, config) {
        Ok(report) if report.is_healthy() => {}
        Ok(report) => {
            error!(
                hits = report.diagnostics.physical_limit_hits,
                "Motor hit a physical limit"
            );
            std::process::exit(2);
        }
        Err(e) => {
            error!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(
    args: &Args,
    config: Result<ScenarioConfig, ConfigError>,
) -> Result<ScenarioReport, Box<dyn std::error::Error>> {
    info!("STRIDER simulator v{} starting...", env!("CARGO_PKG_VERSION"));
    let config = config?;
    info!(
        "Loaded scenario {} with {} steps from {}",
        config.shared.service_name,
        config.steps.len(),
        args.config.display()
    );

    let mut runner = ScenarioRunner::new(&config)?;

    let report = if args.realtime {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            flag.store(false, Ordering::SeqCst);
        })?;
        let tick = runner.tick();
        runner.run_with(|_| {
            std::thread::sleep(tick);
            running.load(Ordering::SeqCst)
        })
    } else {
        runner.run()
    };

    if report.interrupted {
        warn!("Scenario interrupted at {:.3} s", report.elapsed_s);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report)
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(level: Level, json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
