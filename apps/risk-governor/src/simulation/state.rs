//! Per-trial mutable state owned by the driver.

use serde::{Deserialize, Serialize};

use crate::config::GatingConfig;
use crate::numeric::safe_div;
use crate::policy::{BreachMonitor, Limits, PolicyContext};

/// State of one trial.
///
/// Invariants: `hwm >= equity > 0` and `remaining_budget >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    /// Global step index (number of completed steps).
    pub step: u64,
    /// Current equity.
    pub equity: f64,
    /// High-water mark.
    pub hwm: f64,
    /// Equity at the start of the current period.
    pub period_start_equity: f64,
    /// Period index.
    pub period: u64,
    /// Steps completed within the current period.
    pub step_in_period: u64,
    /// Realized P&L of the last step.
    pub last_pnl: f64,
    /// Risk fraction applied on the last step.
    pub last_risk: f64,
    /// Latched breach counters and target flag.
    pub breaches: BreachMonitor,
    /// Remaining period budget mirrored from the budget gate.
    pub remaining_budget: f64,
    /// EMA of squared per-step portfolio returns.
    pub return_var_ewma: f64,
}

impl SimulationState {
    /// Fresh state at trial start.
    #[must_use]
    pub fn new(initial_equity: f64, period_limit: f64) -> Self {
        Self {
            step: 0,
            equity: initial_equity,
            hwm: initial_equity,
            period_start_equity: initial_equity,
            period: 0,
            step_in_period: 0,
            last_pnl: 0.0,
            last_risk: 0.0,
            breaches: BreachMonitor::default(),
            remaining_budget: period_limit * initial_equity,
            return_var_ewma: 0.0,
        }
    }

    /// Realized volatility estimate.
    #[must_use]
    pub fn realized_vol(&self) -> f64 {
        self.return_var_ewma.max(0.0).sqrt()
    }

    /// Drawdown from HWM.
    #[must_use]
    pub fn drawdown(&self) -> f64 {
        safe_div(self.hwm - self.equity, self.hwm)
    }

    /// Build the immutable context for the next step.
    #[must_use]
    pub fn context<'a>(
        &self,
        limits: Limits,
        requested_risk: f64,
        gating: &'a GatingConfig,
    ) -> PolicyContext<'a> {
        PolicyContext::new(self.step, self.equity, self.hwm, limits, gating)
            .with_period(self.period, self.period_start_equity)
            .with_history(self.last_pnl, self.last_risk)
            .with_requested_risk(requested_risk)
            .with_realized_vol(self.realized_vol())
    }

    /// Consume `amount` of the period budget, never going below zero.
    pub fn spend_budget(&mut self, amount: f64) {
        self.remaining_budget = (self.remaining_budget - amount.abs()).max(0.0);
    }

    /// Close the current period and open the next one at the current equity.
    pub fn roll_period(&mut self, period_limit: f64) {
        self.period += 1;
        self.step_in_period = 0;
        self.period_start_equity = self.equity;
        self.remaining_budget = period_limit * self.equity;
        self.breaches.start_period();
    }

    /// Number of periods in which at least one step ran.
    #[must_use]
    pub const fn periods_touched(&self) -> u64 {
        if self.step_in_period > 0 {
            self.period + 1
        } else {
            self.period
        }
    }

    /// Fold a portfolio return into the volatility EMA with decay `lambda`.
    pub fn update_vol(&mut self, portfolio_return: f64, lambda: f64) {
        let r2 = portfolio_return * portfolio_return;
        self.return_var_ewma = lambda.mul_add(self.return_var_ewma, (1.0 - lambda) * r2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = SimulationState::new(1.0, 0.02);
        assert!((state.remaining_budget - 0.02).abs() < f64::EPSILON);
        assert_eq!(state.drawdown(), 0.0);
        assert_eq!(state.realized_vol(), 0.0);
    }

    #[test]
    fn test_vol_ema_without_memory_tracks_last_return() {
        let mut state = SimulationState::new(1.0, 0.02);
        state.update_vol(0.03, 0.0);
        assert!((state.realized_vol() - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_budget_never_negative_and_resets_on_roll() {
        let mut state = SimulationState::new(1.0, 0.02);
        state.spend_budget(0.05);
        assert_eq!(state.remaining_budget, 0.0);

        state.equity = 1.1;
        state.step_in_period = 3;
        state.roll_period(0.02);
        assert_eq!(state.period, 1);
        assert_eq!(state.step_in_period, 0);
        assert!((state.period_start_equity - 1.1).abs() < f64::EPSILON);
        assert!((state.remaining_budget - 0.022).abs() < 1e-12);
        assert_eq!(state.periods_touched(), 1);
    }

    #[test]
    fn test_context_carries_history() {
        let gating = GatingConfig::default();
        let mut state = SimulationState::new(1.0, 0.02);
        state.step = 4;
        state.last_pnl = -0.001;
        state.last_risk = 0.01;
        state.equity = 0.99;

        let ctx = state.context(Limits::default(), 0.01, &gating);
        assert_eq!(ctx.step, 4);
        assert!(ctx.after_loss());
        assert!((ctx.previous_risk - 0.01).abs() < f64::EPSILON);
        assert!((ctx.drawdown - 0.01).abs() < 1e-12);
    }
}
