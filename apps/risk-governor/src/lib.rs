// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Risk Governor - Rust Core Library
//!
//! Deterministic governor that decides, step by step, what fraction of
//! capital to put at risk under a per-period loss limit and a lifetime loss
//! limit, and estimates by Monte Carlo how likely a configuration is to reach
//! its profit target without a breach.
//!
//! # Architecture
//!
//! - **Policy**: independent modules, each a pure function of a read-only
//!   context to a bounded proposal
//!   - `freeze`: hysteresis freeze on the cushion above the protective floor
//!   - `budget_gate`: period budget, pacing and volatility-tightened cap
//!   - `soft_barrier`: piecewise-linear throttle on drawdown
//!   - `vol_target`: EWMA volatility targeting
//!
//! - **Engine**: aggregation of proposals and global invariants
//!   (freeze override, no upsize after a loss, external cap, blackout and
//!   session gating), plus per-step telemetry sinks
//!
//! - **Simulation**: single-trial driver over a pluggable return generator
//!   with a per-trial seeded RNG, pass/fail evaluation and KPIs
//!
//! - **Monte Carlo**: Rayon-parallel batches, Wilson score interval on the
//!   pass probability, KPI quantiles
//!
//! # Determinism
//!
//! Given a configuration and a seed every trial is bit-for-bit
//! reproducible; batch statistics do not depend on thread count or
//! completion order.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Configuration loading and validation.
pub mod config;

/// Aggregation, gating and per-step telemetry.
pub mod engine;

/// Crate-level error type.
pub mod error;

/// Monte Carlo batches and statistics.
pub mod monte_carlo;

/// Numeric guards and small statistics helpers.
pub mod numeric;

/// Metrics recording.
pub mod observability;

/// Policy modules and their shared contract.
pub mod policy;

/// Single-trial simulation.
pub mod simulation;

/// Tracing subscriber setup.
pub mod telemetry;

pub use config::{Config, ConfigError, load_config, load_config_from_string};
pub use engine::{AggregationResult, TelemetrySink, aggregate};
pub use error::GovernorError;
pub use monte_carlo::{MonteCarloError, MonteCarloHarness, MonteCarloResult};
pub use policy::{PolicyContext, PolicyKind, PolicyModule, PolicyProposal, RiskPolicy};
pub use simulation::{ReturnGenerator, RunResult, SampledReturns, TrialError, run_trial};

use engine::{NullSink, TracingSink};

/// Run one trial with the configured return model.
///
/// # Errors
///
/// Returns [`GovernorError::Config`] if the configuration is invalid and
/// [`GovernorError::Trial`] if the trial hits a non-finite value.
pub fn run_single(config: &Config, seed: u64) -> Result<RunResult, GovernorError> {
    config.validate()?;
    let mut generator = SampledReturns::new(&config.market)?;

    let result = if config.observability.logging.trace_steps {
        simulation::simulate(config, &mut generator, seed, &mut TracingSink)?
    } else {
        simulation::simulate(config, &mut generator, seed, &mut NullSink)?
    };
    Ok(result)
}

/// Run a Monte Carlo batch with the configured return model.
///
/// Trial `i` uses seed `base_seed + i`.
///
/// # Errors
///
/// Returns [`GovernorError::Config`] if the configuration is invalid and
/// [`GovernorError::MonteCarlo`] if the batch cannot run.
pub fn run_monte_carlo(
    config: &Config,
    n_trials: u64,
    base_seed: u64,
    confidence: f64,
) -> Result<MonteCarloResult, GovernorError> {
    let generator = SampledReturns::new(&config.market)?;
    let harness = MonteCarloHarness::new(config.clone(), generator)?;
    Ok(harness.run(n_trials, base_seed, confidence)?)
}
