//! Error types for Monte Carlo batches.

use thiserror::Error;

/// Errors that prevent a batch from running.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonteCarloError {
    /// Zero trials requested.
    #[error("No Monte Carlo trials requested")]
    NoTrials,

    /// Confidence level outside `(0, 1)`.
    #[error("Confidence level must be in (0, 1), got {value}")]
    InvalidConfidence {
        /// Rejected confidence level.
        value: f64,
    },

    /// Dedicated thread pool could not be built.
    #[error("Failed to initialize thread pool: {message}")]
    ThreadPool {
        /// Error message.
        message: String,
    },
}
