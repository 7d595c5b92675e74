//! Kinesis - headless race runner
//!
//! Builds one engine from a JSON config, claims a single tick driver and
//! prints the final standings as JSON.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use kinesis::sim::{DriverMode, SimulationEngine, TickDriver};
use kinesis::{ConfigError, SimConfig, SimResult};

/// Who drives the tick
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Wall-clock fixed-step loop
    Autonomous,
    /// One tick per step, as fast as possible
    Stepped,
}

impl From<Mode> for DriverMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Autonomous => DriverMode::Autonomous,
            Mode::Stepped => DriverMode::Stepped,
        }
    }
}

#[derive(Parser)]
#[command(name = "kinesis", about = "TTC-driven racing simulation")]
struct Cli {
    /// JSON config file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,

    /// Tick driver
    #[arg(long, value_enum, default_value_t = Mode::Stepped)]
    mode: Mode,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,
}

/// Run length as a `Duration`; negative, NaN and out of range values are
/// config errors
fn run_length(seconds: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| ConfigError::Invalid(format!("--seconds {seconds}: {e}")))
}

fn run(cli: Cli) -> SimResult<()> {
    let length = run_length(cli.seconds)?;

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let mut engine = SimulationEngine::with_population(config)?;

    match engine.claim_driver(cli.mode.into())? {
        TickDriver::Autonomous(mut driver) => {
            let ticks = driver.run_for(&mut engine, length)?;
            log::info!("Autonomous run finished: {ticks} ticks");
        }
        TickDriver::Stepped(mut driver) => {
            let ticks = (length.as_secs_f64() * engine.config().sim_tick_rate).round() as u64;
            for _ in 0..ticks {
                driver.step(&mut engine)?;
            }
            log::info!("Stepped run finished: {} ticks", driver.ticks());
        }
    }

    let summary = engine.summary();
    log::info!(
        "Summary: {} agents ({} moving, {} crashed, {} out of fuel, {} finished) over {} ticks",
        summary.agents,
        summary.moving,
        summary.crashed,
        summary.out_of_fuel,
        summary.finished,
        summary.ticks
    );

    match serde_json::to_string_pretty(engine.leaderboard()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to encode leaderboard: {e}"),
    }
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Kinesis starting...");

    if let Err(e) = run(Cli::parse()) {
        eprintln!("fatal: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_length_accepts_plain_seconds() {
        assert_eq!(run_length(10.0).unwrap(), Duration::from_secs(10));
        assert_eq!(run_length(0.0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_run_length_rejects_unrepresentable() {
        for seconds in [f64::INFINITY, f64::NAN, -1.0, 1e30] {
            assert!(
                matches!(run_length(seconds), Err(ConfigError::Invalid(_))),
                "{seconds} accepted"
            );
        }
    }

    #[test]
    fn test_infinite_seconds_is_fatal_not_a_panic() {
        let cli = Cli::parse_from(["kinesis", "--seconds", "inf"]);
        assert!(matches!(
            run(cli),
            Err(kinesis::SimError::Config(ConfigError::Invalid(_)))
        ));
    }
}
