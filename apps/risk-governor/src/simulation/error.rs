//! Error types for a single trial.

use thiserror::Error;

/// A trial produced a value that cannot be sanitized.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum TrialError {
    /// The return generator produced NaN or infinity.
    #[error("Return generator produced non-finite value {value} at step {step}")]
    NonFiniteReturn {
        /// Step index.
        step: u64,
        /// Offending value.
        value: f64,
    },

    /// Equity became non-finite.
    #[error("Equity became non-finite at step {step}")]
    NonFiniteEquity {
        /// Step index.
        step: u64,
    },
}

impl TrialError {
    /// Step at which the trial failed.
    #[must_use]
    pub const fn step(&self) -> u64 {
        match self {
            Self::NonFiniteReturn { step, .. } | Self::NonFiniteEquity { step } => *step,
        }
    }
}
