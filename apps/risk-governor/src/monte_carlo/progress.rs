//! Progress tracking and cancellation for Monte Carlo batches.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::result::TrialOutcome;

/// Running tally of a batch, shared by its workers.
///
/// Counts passes and invalid trials as they finish so that progress logs
/// show the pass rate forming, not only how many trials are left.
#[derive(Debug)]
pub struct ProgressTracker {
    total: u64,
    finished: AtomicU64,
    passed: AtomicU64,
    invalid: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    /// Tracker for a batch of `total` trials.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            finished: AtomicU64::new(0),
            passed: AtomicU64::new(0),
            invalid: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Fold a finished trial into the tally.
    pub fn record(&self, outcome: &TrialOutcome) {
        match outcome {
            TrialOutcome::Completed(summary) if summary.passed => {
                self.passed.fetch_add(1, Ordering::Relaxed);
            }
            TrialOutcome::Completed(_) => {}
            TrialOutcome::Invalid { .. } => {
                self.invalid.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Current tally with a time-to-finish estimate.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn snapshot(&self) -> Progress {
        let finished = self.finished.load(Ordering::Relaxed);
        let remaining = self.total.saturating_sub(finished);
        let eta_secs = if finished == 0 {
            0
        } else {
            let per_trial = self.start_time.elapsed().as_secs_f64() / finished as f64;
            (per_trial * remaining as f64) as u64
        };

        Progress {
            total: self.total,
            finished,
            passed: self.passed.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            eta_secs,
        }
    }
}

/// Batch tally at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Trials in the batch.
    pub total: u64,
    /// Trials finished, valid or not.
    pub finished: u64,
    /// Valid trials that passed.
    pub passed: u64,
    /// Trials excluded for a numeric failure.
    pub invalid: u64,
    /// Estimated seconds until the batch finishes.
    pub eta_secs: u64,
}

impl Progress {
    /// Share of the batch finished, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.finished as f64 / self.total as f64 * 100.0
        }
    }

    /// Finished trials that count towards the statistics.
    #[must_use]
    pub const fn valid(&self) -> u64 {
        self.finished.saturating_sub(self.invalid)
    }

    /// Pass rate over the valid trials finished so far.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn running_pass_rate(&self) -> Option<f64> {
        match self.valid() {
            0 => None,
            valid => Some(self.passed as f64 / valid as f64),
        }
    }
}

/// Cooperative cancellation flag, checked before each trial starts.
///
/// Clones share the same flag. Trials already running finish normally.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
