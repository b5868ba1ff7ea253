//! Latched breach and target detection.

use serde::{Deserialize, Serialize};

use super::types::Limits;

/// Latched breach counters for one trial.
///
/// Counters only grow and the flags never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachMonitor {
    /// Number of periods in which the period limit was breached.
    pub period_breaches: u64,
    /// Number of lifetime breaches (0 or 1).
    pub lifetime_breaches: u64,
    /// Step at which the target was first reached.
    pub target_hit_step: Option<u64>,
    period_latched: bool,
}

/// Result of one breach check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreachCheck {
    /// A new period breach was recorded.
    pub period_breach: bool,
    /// A lifetime breach was recorded.
    pub lifetime_breach: bool,
    /// The target was reached for the first time.
    pub target_hit: bool,
}

impl BreachMonitor {
    /// Check `equity` after `step` against period, lifetime and target thresholds.
    ///
    /// A period breach is counted at most once per period.
    pub fn check(
        &mut self,
        step: u64,
        equity: f64,
        period_start_equity: f64,
        limits: &Limits,
    ) -> BreachCheck {
        let mut result = BreachCheck::default();

        if !self.period_latched && equity < period_start_equity * (1.0 - limits.period_limit) {
            self.period_latched = true;
            self.period_breaches += 1;
            result.period_breach = true;
        }

        if self.lifetime_breaches == 0
            && equity < limits.initial_equity * (1.0 - limits.lifetime_limit)
        {
            self.lifetime_breaches = 1;
            result.lifetime_breach = true;
        }

        if self.target_hit_step.is_none()
            && equity >= limits.initial_equity * (1.0 + limits.target_profit_pct)
        {
            self.target_hit_step = Some(step);
            result.target_hit = true;
        }

        result
    }

    /// Release the per-period latch at a period rollover.
    pub fn start_period(&mut self) {
        self.period_latched = false;
    }

    /// Whether any limit was ever breached.
    #[must_use]
    pub const fn any_breach(&self) -> bool {
        self.period_breaches > 0 || self.lifetime_breaches > 0
    }

    /// Whether the lifetime limit was breached.
    #[must_use]
    pub const fn lifetime_breached(&self) -> bool {
        self.lifetime_breaches > 0
    }

    /// Whether the profit target was reached.
    #[must_use]
    pub const fn target_hit(&self) -> bool {
        self.target_hit_step.is_some()
    }
}
