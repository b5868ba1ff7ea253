//! Monte Carlo harness: many seeded trials, a Wilson interval on the pass
//! probability and quantile summaries of the trial KPIs.
//!
//! # Example
//!
//! ```ignore
//! use risk_governor::config::Config;
//! use risk_governor::monte_carlo::MonteCarloHarness;
//! use risk_governor::simulation::SampledReturns;
//!
//! let config = Config::default();
//! let generator = SampledReturns::new(&config.market)?;
//! let result = MonteCarloHarness::new(config, generator)?.run(1000, 42, 0.95)?;
//! println!("pass rate {:.3} [{:.3}, {:.3}]", result.pass_rate, result.ci_lower, result.ci_upper);
//! ```

mod error;
mod harness;
mod progress;
mod result;
mod stats;

pub use error::MonteCarloError;
pub use harness::MonteCarloHarness;
pub use progress::{CancelToken, Progress, ProgressTracker};
pub use result::{InvalidTrial, KpiQuantiles, MonteCarloResult, TerminationBreakdown, TrialOutcome};
pub use stats::{QuantileSummary, inverse_normal_cdf, wilson_interval, z_from_confidence};
