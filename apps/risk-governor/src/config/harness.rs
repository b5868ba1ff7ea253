//! Configuration for the Monte Carlo harness.

use serde::{Deserialize, Serialize};

use super::modules::default_true;

/// Configuration for parallel trial execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Number of trials used when the caller does not pass one.
    #[serde(default = "default_trials")]
    pub trials: u64,

    /// Base seed used when the caller does not pass one.
    #[serde(default = "default_base_seed")]
    pub base_seed: u64,

    /// Two-sided confidence level of the pass-rate interval.
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Maximum number of threads to use (0 = use all available).
    #[serde(default)]
    pub max_threads: usize,

    /// Whether to collect progress counters.
    #[serde(default = "default_true")]
    pub track_progress: bool,

    /// Minimum parallelization threshold (batches below this run sequentially).
    #[serde(default = "default_min_parallel_trials")]
    pub min_parallel_trials: u64,

    /// Keep a lightweight summary of every trial in the batch result.
    #[serde(default = "default_true")]
    pub keep_trial_summaries: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            base_seed: default_base_seed(),
            confidence: default_confidence(),
            max_threads: 0,
            track_progress: true,
            min_parallel_trials: default_min_parallel_trials(),
            keep_trial_summaries: true,
        }
    }
}

const fn default_trials() -> u64 {
    1000
}

const fn default_base_seed() -> u64 {
    42
}

const fn default_confidence() -> f64 {
    0.95
}

const fn default_min_parallel_trials() -> u64 {
    4
}
