//! Period and lifetime loss budgets.
//!
//! The gate tracks a per-period risk budget in currency units. It starts
//! every period at `period_limit * period_start_equity` and is consumed by
//! `applied_risk * equity_before` on every step. The proposal is the
//! smallest of:
//!
//! - the upstream requested risk
//! - a volatility-tightened exposure cap in `[cap_min, cap_base]`
//! - a pacing allowance, `pacing_rate` of the remaining budget as an equity fraction
//!
//! # States
//!
//! ```text
//! Active ──budget spent──▶ PeriodExhausted ──rollover──▶ Active
//!    │                            │
//!    └──── lifetime limit ────────┴──▶ LifetimeBreached (terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::numeric::{EPSILON, safe_div};

use super::types::{PolicyContext, PolicyProposal, StepOutcome};

/// Budget gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetState {
    /// Budget available.
    #[default]
    Active,
    /// Period budget spent; resets at the next rollover.
    PeriodExhausted,
    /// Lifetime limit reached; never leaves this state.
    LifetimeBreached,
}

/// Budget gate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetParams {
    /// Starting equity of the trial.
    pub initial_equity: f64,
    /// Maximum loss per period (fraction of period-start equity).
    pub period_limit: f64,
    /// Maximum cumulative loss (fraction of initial equity).
    pub lifetime_limit: f64,
    /// Share of the remaining budget spendable per step.
    pub pacing_rate: f64,
    /// Exposure cap at or below the reference volatility.
    pub cap_base: f64,
    /// Floor of the tightened cap.
    pub cap_min: f64,
    /// Reference volatility.
    pub reference_vol: f64,
}

impl BudgetParams {
    /// Extract the budget parameters from a configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            initial_equity: config.initial_equity,
            period_limit: config.period_limit,
            lifetime_limit: config.lifetime_limit,
            pacing_rate: config.pacing_rate,
            cap_base: config.exposure_cap_base,
            cap_min: config.exposure_cap_min,
            reference_vol: config.reference_vol,
        }
    }

    /// Exposure cap tightened by realized volatility.
    ///
    /// `clamp(cap_base * ref_vol / max(ref_vol, realized_vol), cap_min, cap_base)`
    #[must_use]
    pub fn dynamic_cap(&self, realized_vol: f64) -> f64 {
        let vol = if realized_vol.is_finite() {
            realized_vol.max(self.reference_vol)
        } else {
            f64::MAX
        };
        let cap = self.cap_base * safe_div(self.reference_vol, vol);
        cap.clamp(self.cap_min, self.cap_base)
    }
}

/// Budget gate policy.
#[derive(Debug, Clone)]
pub struct BudgetGate {
    params: BudgetParams,
    state: BudgetState,
    remaining: f64,
    resets: u64,
}

impl BudgetGate {
    /// Create a gate with a full first-period budget.
    #[must_use]
    pub fn new(params: BudgetParams) -> Self {
        Self {
            params,
            state: BudgetState::Active,
            remaining: params.period_limit * params.initial_equity,
            resets: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BudgetState {
        self.state
    }

    /// Remaining period budget in currency units; never negative.
    #[must_use]
    pub const fn remaining_budget(&self) -> f64 {
        self.remaining
    }

    /// Number of period resets performed.
    #[must_use]
    pub const fn resets(&self) -> u64 {
        self.resets
    }

    /// Propose a risk fraction for the step.
    #[must_use]
    pub fn propose(&self, ctx: &PolicyContext<'_>) -> PolicyProposal {
        let lifetime_dd = ctx.limits.lifetime_drawdown(ctx.equity);
        if self.state == BudgetState::LifetimeBreached || lifetime_dd >= self.params.lifetime_limit
        {
            return PolicyProposal::new(0.0).with_note("lifetime_drawdown", lifetime_dd);
        }
        if self.state == BudgetState::PeriodExhausted {
            return PolicyProposal::new(0.0).with_note("remaining_budget", self.remaining);
        }

        let cap = self.params.dynamic_cap(ctx.realized_vol);
        let pacing = self.params.pacing_rate * safe_div(self.remaining, ctx.equity);
        let mut risk = ctx.requested_risk.min(cap).min(pacing);

        if ctx.after_loss() && risk > ctx.previous_risk {
            risk = ctx.previous_risk;
        }

        PolicyProposal::new(risk)
            .with_note("dynamic_cap", cap)
            .with_note("pacing_allowance", pacing)
            .with_note("remaining_budget", self.remaining)
    }

    /// Consume budget for the realized step and handle rollover.
    pub fn observe(&mut self, outcome: &StepOutcome) {
        if self.state == BudgetState::LifetimeBreached {
            return;
        }

        let spent = outcome.applied_risk.abs() * outcome.equity_before;
        self.remaining = (self.remaining - spent).max(0.0);

        let lifetime_dd = 1.0 - safe_div(outcome.equity_after, self.params.initial_equity);
        if lifetime_dd >= self.params.lifetime_limit {
            self.state = BudgetState::LifetimeBreached;
            return;
        }

        if self.remaining <= EPSILON {
            self.state = BudgetState::PeriodExhausted;
        }

        if outcome.period_rollover {
            self.remaining = self.params.period_limit * outcome.equity_after;
            self.resets += 1;
            self.state = BudgetState::Active;
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::config::GatingConfig;
    use crate::policy::types::Limits;

    fn params() -> BudgetParams {
        BudgetParams::from_config(&Config::default())
    }

    fn outcome(applied_risk: f64, equity_before: f64, equity_after: f64, rollover: bool) -> StepOutcome {
        StepOutcome {
            step: 0,
            applied_risk,
            market_return: 0.0,
            pnl: equity_after - equity_before,
            equity_before,
            equity_after,
            hwm_after: equity_before.max(equity_after),
            cushion_after: 0.1,
            period_rollover: rollover,
        }
    }

    #[test_case(0.0, 0.02 ; "calm market uses base cap")]
    #[test_case(0.01, 0.02 ; "reference vol uses base cap")]
    #[test_case(0.02, 0.01 ; "double vol halves cap")]
    #[test_case(1.0, 0.005 ; "extreme vol floors at min cap")]
    #[test_case(f64::NAN, 0.005 ; "non-finite vol floors at min cap")]
    fn test_dynamic_cap(vol: f64, expected: f64) {
        let cap = params().dynamic_cap(vol);
        assert!((cap - expected).abs() < 1e-12, "cap {cap} != {expected}");
    }

    #[test]
    fn test_proposal_is_min_of_request_cap_and_pacing() {
        let gating = GatingConfig::default();
        let gate = BudgetGate::new(params());
        let ctx = PolicyContext::new(0, 1.0, 1.0, Limits::default(), &gating).with_requested_risk(0.05);

        // pacing = 0.33 * 0.02 = 0.0066 < cap 0.02 < request 0.05
        let proposal = gate.propose(&ctx);
        assert!((proposal.risk - 0.0066).abs() < 1e-12);
    }

    #[test]
    fn test_no_upsize_after_loss() {
        let gating = GatingConfig::default();
        let gate = BudgetGate::new(params());
        let ctx = PolicyContext::new(0, 1.0, 1.0, Limits::default(), &gating)
            .with_requested_risk(0.05)
            .with_history(-0.001, 0.004);

        assert!((gate.propose(&ctx).risk - 0.004).abs() < 1e-12);
    }

    #[test]
    fn test_lifetime_drawdown_proposes_zero() {
        let gating = GatingConfig::default();
        let gate = BudgetGate::new(params());
        let ctx = PolicyContext::new(0, 0.89, 1.0, Limits::default(), &gating).with_requested_risk(0.01);

        assert_eq!(gate.propose(&ctx).risk, 0.0);
    }

    #[test]
    fn test_budget_consumed_and_never_negative() {
        let mut gate = BudgetGate::new(params());
        gate.observe(&outcome(0.015, 1.0, 0.99, false));
        assert!((gate.remaining_budget() - 0.005).abs() < 1e-12);

        gate.observe(&outcome(0.015, 0.99, 0.98, false));
        assert_eq!(gate.remaining_budget(), 0.0);
        assert_eq!(gate.state(), BudgetState::PeriodExhausted);
    }

    #[test]
    fn test_exhausted_period_proposes_zero_until_rollover() {
        let gating = GatingConfig::default();
        let mut gate = BudgetGate::new(params());
        gate.observe(&outcome(0.02, 1.0, 1.0, false));
        assert_eq!(gate.state(), BudgetState::PeriodExhausted);

        let ctx = PolicyContext::new(1, 1.0, 1.0, Limits::default(), &gating).with_requested_risk(0.01);
        assert_eq!(gate.propose(&ctx).risk, 0.0);

        gate.observe(&outcome(0.0, 1.0, 1.0, true));
        assert_eq!(gate.state(), BudgetState::Active);
        assert!(gate.propose(&ctx).risk > 0.0);
    }

    #[test]
    fn test_rollover_resets_to_current_equity() {
        let mut gate = BudgetGate::new(params());
        gate.observe(&outcome(0.005, 1.0, 1.05, true));

        assert!((gate.remaining_budget() - 0.02 * 1.05).abs() < 1e-12);
        assert_eq!(gate.resets(), 1);
    }

    #[test]
    fn test_lifetime_breach_is_terminal() {
        let mut gate = BudgetGate::new(params());
        gate.observe(&outcome(0.01, 1.0, 0.85, false));
        assert_eq!(gate.state(), BudgetState::LifetimeBreached);

        gate.observe(&outcome(0.0, 0.85, 1.2, true));
        assert_eq!(gate.state(), BudgetState::LifetimeBreached);
        assert_eq!(gate.resets(), 0);
    }
}
