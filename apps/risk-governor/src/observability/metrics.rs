//! Batch and trial metrics.
//!
//! # Example
//!
//! ```ignore
//! use risk_governor::observability::record_trial;
//!
//! // Record a passing trial that ended on its profit target
//! record_trial("target_hit", true);
//! ```

use metrics::{counter, gauge, histogram};

// ============================================================================
// Trial Metrics
// ============================================================================

/// Record a completed trial.
///
/// # Arguments
///
/// * `termination` - Why the trial ended (e.g., "target_hit", "lifetime_breach", "max_length")
/// * `passed` - Whether the trial met every pass criterion
pub fn record_trial(termination: &str, passed: bool) {
    counter!(
        "risk_governor_trials_total",
        "termination" => termination.to_string(),
        "outcome" => if passed { "pass" } else { "fail" }
    )
    .increment(1);
}

/// Record a trial excluded for numeric failure.
pub fn record_invalid_trial() {
    counter!("risk_governor_invalid_trials_total").increment(1);
}

// ============================================================================
// Batch Metrics
// ============================================================================

/// Record a finished Monte Carlo batch.
///
/// # Arguments
///
/// * `trials` - Number of trials that completed
/// * `pass_rate` - Fraction of valid trials that passed
/// * `duration_seconds` - Wall-clock time of the batch
pub fn record_batch(trials: u64, pass_rate: f64, duration_seconds: f64) {
    counter!("risk_governor_batches_total").increment(1);
    #[allow(clippy::cast_precision_loss)]
    gauge!("risk_governor_batch_trials").set(trials as f64);
    gauge!("risk_governor_pass_rate").set(pass_rate);
    histogram!("risk_governor_batch_duration_seconds").record(duration_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_trial("target_hit", true);
        record_invalid_trial();
        record_batch(10, 0.5, 0.01);
    }
}
