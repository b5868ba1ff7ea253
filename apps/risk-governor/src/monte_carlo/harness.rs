//! Parallel Monte Carlo executor using Rayon.
//!
//! Trial `i` runs with seed `base_seed + i` (wrapping) and a fresh clone of
//! the return generator, so its outcome depends only on its index. Trials
//! share nothing but the progress counters and the cancellation flag.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{Level, debug, info, span, warn};

use crate::config::{Config, ConfigError};
use crate::engine::{NullSink, TracingSink};
use crate::observability::{record_batch, record_invalid_trial, record_trial};
use crate::simulation::{ReturnGenerator, simulate};

use super::error::MonteCarloError;
use super::progress::{CancelToken, ProgressTracker};
use super::result::{MonteCarloResult, TrialOutcome};

/// Monte Carlo harness over one configuration and one return generator.
#[derive(Debug)]
pub struct MonteCarloHarness<G> {
    config: Config,
    generator: G,
    cancel: CancelToken,
}

impl<G: ReturnGenerator> MonteCarloHarness<G> {
    /// Create a harness over a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the first rejected field.
    /// No trial can start with a configuration that fails here.
    pub fn new(config: Config, generator: G) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            generator,
            cancel: CancelToken::new(),
        })
    }

    /// Token that stops the batch at the next trial boundary.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run trials using the batch settings of the configuration.
    ///
    /// # Errors
    ///
    /// See [`MonteCarloHarness::run`].
    pub fn run_configured(&self) -> Result<MonteCarloResult, MonteCarloError> {
        let harness = &self.config.harness;
        self.run(harness.trials, harness.base_seed, harness.confidence)
    }

    /// Run `n_trials` trials.
    ///
    /// # Errors
    ///
    /// Returns error if no trials are requested, the confidence level is not
    /// in `(0, 1)`, or the dedicated thread pool cannot be built.
    #[allow(clippy::cast_possible_truncation)]
    pub fn run(
        &self,
        n_trials: u64,
        base_seed: u64,
        confidence: f64,
    ) -> Result<MonteCarloResult, MonteCarloError> {
        if n_trials == 0 {
            return Err(MonteCarloError::NoTrials);
        }
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(MonteCarloError::InvalidConfidence { value: confidence });
        }

        let tracker = ProgressTracker::new(n_trials);
        let start_time = Instant::now();

        info!(
            n_trials,
            base_seed,
            threads = self.effective_thread_count(),
            "Starting Monte Carlo batch"
        );

        let outcomes = if n_trials >= self.config.harness.min_parallel_trials {
            self.run_parallel(n_trials, base_seed, &tracker)?
        } else {
            self.run_sequential(n_trials, base_seed, &tracker)
        };

        let elapsed = start_time.elapsed();
        let mut result = MonteCarloResult::from_outcomes(
            n_trials,
            confidence,
            outcomes,
            self.config.harness.keep_trial_summaries,
        );
        result.duration_ms = elapsed.as_millis() as u64;
        record_batch(result.completed, result.pass_rate, elapsed.as_secs_f64());

        if result.cancelled {
            warn!(
                completed = result.completed,
                n_trials, "Monte Carlo batch cancelled"
            );
        }
        info!(
            completed = result.completed,
            invalid = result.invalid,
            passes = result.passes,
            pass_rate = result.pass_rate,
            ci_lower = result.ci_lower,
            ci_upper = result.ci_upper,
            elapsed_secs = elapsed.as_secs_f64(),
            "Monte Carlo batch complete"
        );

        Ok(result)
    }

    fn run_parallel(
        &self,
        n_trials: u64,
        base_seed: u64,
        tracker: &ProgressTracker,
    ) -> Result<Vec<TrialOutcome>, MonteCarloError> {
        let collect = || -> Vec<TrialOutcome> {
            (0..n_trials)
                .into_par_iter()
                .filter_map(|index| self.execute_trial(index, base_seed, tracker))
                .collect()
        };

        let max_threads = self.config.harness.max_threads;
        if max_threads == 0 {
            return Ok(collect());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .build()
            .map_err(|e| MonteCarloError::ThreadPool {
                message: e.to_string(),
            })?;
        Ok(pool.install(collect))
    }

    fn run_sequential(
        &self,
        n_trials: u64,
        base_seed: u64,
        tracker: &ProgressTracker,
    ) -> Vec<TrialOutcome> {
        (0..n_trials)
            .filter_map(|index| self.execute_trial(index, base_seed, tracker))
            .collect()
    }

    fn execute_trial(
        &self,
        index: u64,
        base_seed: u64,
        tracker: &ProgressTracker,
    ) -> Option<TrialOutcome> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let seed = base_seed.wrapping_add(index);
        let _span = span!(Level::DEBUG, "trial", seed).entered();
        let mut generator = self.generator.clone();

        let run = if self.config.observability.logging.trace_steps {
            simulate(&self.config, &mut generator, seed, &mut TracingSink)
        } else {
            simulate(&self.config, &mut generator, seed, &mut NullSink)
        };

        let outcome = match run {
            Ok(result) => {
                record_trial(result.termination.as_str(), result.passed);
                TrialOutcome::Completed(result.summary())
            }
            Err(error) => {
                warn!(seed, %error, "Trial excluded as invalid");
                record_invalid_trial();
                TrialOutcome::Invalid { seed, error }
            }
        };
        tracker.record(&outcome);

        if self.config.harness.track_progress {
            let progress = tracker.snapshot();
            debug!(
                percent = progress.percentage(),
                finished = progress.finished,
                total = progress.total,
                invalid = progress.invalid,
                pass_rate = ?progress.running_pass_rate(),
                eta_secs = progress.eta_secs,
                "Batch progress"
            );
        }

        Some(outcome)
    }

    /// Number of worker threads a parallel batch would use.
    #[must_use]
    pub fn effective_thread_count(&self) -> usize {
        if self.config.harness.max_threads > 0 {
            self.config.harness.max_threads
        } else {
            rayon::current_num_threads()
        }
    }
}
