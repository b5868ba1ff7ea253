//! Crate-level error type.
//!
//! Each concern owns its own error enum:
//!
//! | Error | Raised by | Meaning |
//! |-------|-----------|---------|
//! | [`ConfigError`] | configuration loading | invalid parameter, named by field |
//! | [`TrialError`] | simulation driver | a trial hit a non-finite value |
//! | [`MonteCarloError`] | batch harness | the batch could not be run |
//!
//! [`GovernorError`] unifies them for the public entry points.

use thiserror::Error;

use crate::config::ConfigError;
use crate::monte_carlo::MonteCarloError;
use crate::simulation::TrialError;

/// Errors returned by [`crate::run_single`], [`crate::run_trial`] and
/// [`crate::run_monte_carlo`].
#[derive(Debug, Error)]
pub enum GovernorError {
    /// Configuration was rejected before any trial ran.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A single run failed numerically.
    #[error(transparent)]
    Trial(#[from] TrialError),

    /// The Monte Carlo batch could not be executed.
    #[error(transparent)]
    MonteCarlo(#[from] MonteCarloError),
}

impl GovernorError {
    /// Whether the error was caused by configuration.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: GovernorError = ConfigError::invalid("period_limit", "must be in (0, 1)").into();
        assert!(err.is_config());
        assert!(err.to_string().contains("period_limit"));
    }

    #[test]
    fn test_trial_error_converts() {
        let err: GovernorError = TrialError::NonFiniteEquity { step: 3 }.into();
        assert!(!err.is_config());
        assert!(err.to_string().contains('3'));
    }
}
