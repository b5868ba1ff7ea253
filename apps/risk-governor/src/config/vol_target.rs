//! Volatility target configuration.

use serde::{Deserialize, Serialize};

/// Parameters of the volatility target policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolTargetConfig {
    /// Target per-step volatility of portfolio returns.
    #[serde(default = "default_target_vol")]
    pub target_vol: f64,
    /// Half-life (steps) of the EWMA variance estimate.
    #[serde(default = "default_halflife")]
    pub halflife: u32,
}

impl Default for VolTargetConfig {
    fn default() -> Self {
        Self {
            target_vol: default_target_vol(),
            halflife: default_halflife(),
        }
    }
}

impl VolTargetConfig {
    /// EWMA decay for the configured half-life; 0 when the half-life is at most one step.
    #[must_use]
    pub fn lambda(&self) -> f64 {
        ewma_lambda(self.halflife)
    }
}

/// Decay factor `exp(-ln 2 / halflife)`, or 0 for `halflife <= 1`.
#[must_use]
pub fn ewma_lambda(halflife: u32) -> f64 {
    if halflife <= 1 {
        0.0
    } else {
        (-std::f64::consts::LN_2 / f64::from(halflife)).exp()
    }
}

const fn default_target_vol() -> f64 {
    0.01
}

const fn default_halflife() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lambda_halves_weight_after_halflife() {
        let lambda = ewma_lambda(10);
        assert!((lambda.powi(10) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_lambda_short_halflife_is_zero() {
        assert_eq!(ewma_lambda(0), 0.0);
        assert_eq!(ewma_lambda(1), 0.0);
    }
}
