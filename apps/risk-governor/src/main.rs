//! Risk Governor Binary
//!
//! Runs a single trial or a Monte Carlo batch and prints the JSON result to
//! stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin risk-governor
//! ```
//!
//! # Environment Variables
//!
//! - `RISK_GOVERNOR_CONFIG`: YAML config path (default: built-in defaults)
//! - `RISK_GOVERNOR_MODE`: `monte_carlo` | `single` (default: `monte_carlo`)
//! - `MC_TRIALS`: number of trials (default: `harness.trials`)
//! - `MC_SEED`: base seed, or the trial seed in single mode (default: `harness.base_seed`)
//! - `MC_CONFIDENCE`: confidence level of the interval (default: `harness.confidence`)
//! - `RUST_LOG`: log filter (default: `observability.logging.level`)

use anyhow::{Context, Result};
use risk_governor::config::{Config, load_config};
use risk_governor::telemetry::init_tracing;
use risk_governor::{run_monte_carlo, run_single};

/// Execution mode selected by `RISK_GOVERNOR_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    MonteCarlo,
    Single,
}

impl Mode {
    fn from_env() -> Result<Self> {
        match std::env::var("RISK_GOVERNOR_MODE") {
            Err(_) => Ok(Self::MonteCarlo),
            Ok(v) => match v.to_lowercase().as_str() {
                "" | "monte_carlo" | "mc" => Ok(Self::MonteCarlo),
                "single" => Ok(Self::Single),
                other => anyhow::bail!("Unknown RISK_GOVERNOR_MODE '{other}'"),
            },
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = read_config()?;
    init_tracing(&config.observability.logging);
    let mode = Mode::from_env()?;

    let trials = env_or("MC_TRIALS", config.harness.trials)?;
    let seed = env_or("MC_SEED", config.harness.base_seed)?;
    let confidence = env_or("MC_CONFIDENCE", config.harness.confidence)?;

    tracing::info!(?mode, trials, seed, confidence, "Starting Risk Governor");

    let output = match mode {
        Mode::Single => {
            let result = run_single(&config, seed).context("Single trial failed")?;
            serde_json::to_string_pretty(&result)?
        }
        Mode::MonteCarlo => {
            let result = run_monte_carlo(&config, trials, seed, confidence)
                .context("Monte Carlo batch failed")?;
            serde_json::to_string_pretty(&result)?
        }
    };

    println!("{output}");
    Ok(())
}

fn read_config() -> Result<Config> {
    match std::env::var("RISK_GOVERNOR_CONFIG") {
        Ok(path) if !path.is_empty() => {
            load_config(Some(&path)).with_context(|| format!("Failed to load config from {path}"))
        }
        _ => Ok(Config::default()),
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {name}: '{v}'")),
        _ => Ok(default),
    }
}
