//! Volatility targeting on realized portfolio returns.

use crate::config::VolTargetConfig;
use crate::numeric::{EPSILON, clamp_unit};

use super::types::{PolicyContext, PolicyProposal, StepOutcome};

/// Volatility target policy.
///
/// Keeps an EWMA of squared portfolio returns and scales the requested
/// risk by `target_vol / sigma_hat`, capped to `[0, 1]`. Until the first
/// observation `sigma_hat` equals the target, so the cap starts at 1.
#[derive(Debug, Clone)]
pub struct VolTarget {
    target_vol: f64,
    lambda: f64,
    var_ewma: f64,
    initialized: bool,
}

impl VolTarget {
    /// Create the policy from its configuration.
    #[must_use]
    pub fn new(config: &VolTargetConfig) -> Self {
        Self {
            target_vol: config.target_vol,
            lambda: config.lambda(),
            var_ewma: 0.0,
            initialized: false,
        }
    }

    /// Current volatility estimate.
    #[must_use]
    pub fn sigma_hat(&self) -> f64 {
        if self.initialized {
            self.var_ewma.sqrt()
        } else {
            self.target_vol
        }
    }

    /// Current risk multiplier in `[0, 1]`.
    #[must_use]
    pub fn cap(&self) -> f64 {
        clamp_unit(self.target_vol / self.sigma_hat().max(EPSILON))
    }

    /// Propose `requested_risk * cap`.
    #[must_use]
    pub fn propose(&self, ctx: &PolicyContext<'_>) -> PolicyProposal {
        let cap = self.cap();
        PolicyProposal::new(ctx.requested_risk * cap)
            .with_note("sigma_hat", self.sigma_hat())
            .with_note("cap", cap)
    }

    /// Fold the step's portfolio return into the variance estimate.
    pub fn observe(&mut self, outcome: &StepOutcome) {
        let r = outcome.portfolio_return();
        if !r.is_finite() {
            return;
        }
        self.var_ewma = self.lambda.mul_add(self.var_ewma, (1.0 - self.lambda) * r * r);
        self.initialized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome_with_return(r: f64) -> StepOutcome {
        StepOutcome {
            step: 0,
            applied_risk: 0.01,
            market_return: r,
            pnl: r,
            equity_before: 1.0,
            equity_after: 1.0 + r,
            hwm_after: 1.0_f64.max(1.0 + r),
            cushion_after: 0.1,
            period_rollover: false,
        }
    }

    #[test]
    fn test_uninitialized_cap_is_one() {
        let policy = VolTarget::new(&VolTargetConfig::default());
        assert!((policy.cap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_high_vol_shrinks_cap() {
        let config = VolTargetConfig {
            target_vol: 0.01,
            halflife: 1,
        };
        let mut policy = VolTarget::new(&config);
        policy.observe(&outcome_with_return(0.04));

        // lambda = 0 for halflife 1, so sigma_hat = |r|
        assert!((policy.sigma_hat() - 0.04).abs() < 1e-12);
        assert!((policy.cap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_low_vol_cap_saturates_at_one() {
        let mut policy = VolTarget::new(&VolTargetConfig::default());
        policy.observe(&outcome_with_return(0.0001));
        assert!((policy.cap() - 1.0).abs() < f64::EPSILON);
    }
}
