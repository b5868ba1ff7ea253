//! Value types shared by every policy module.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{Config, GatingConfig};
use crate::numeric::{clamp_unit, safe_div};

/// Closed set of policy kinds, in canonical registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Hysteresis freeze on the cushion above the protective floor.
    Freeze,
    /// Period and lifetime loss budgets.
    BudgetGate,
    /// Drawdown-to-multiplier curve.
    SoftBarrier,
    /// Volatility targeting.
    VolTarget,
}

impl PolicyKind {
    /// Every kind, in registration order.
    pub const ALL: [Self; 4] = [
        Self::Freeze,
        Self::BudgetGate,
        Self::SoftBarrier,
        Self::VolTarget,
    ];

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Freeze => "freeze",
            Self::BudgetGate => "budget_gate",
            Self::SoftBarrier => "soft_barrier",
            Self::VolTarget => "vol_target",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured limits carried by every context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Starting equity of the trial.
    pub initial_equity: f64,
    /// Maximum loss per period (fraction of period-start equity).
    pub period_limit: f64,
    /// Maximum cumulative loss (fraction of initial equity).
    pub lifetime_limit: f64,
    /// Profit target (fraction of initial equity).
    pub target_profit_pct: f64,
    /// Drawdown tolerance defining the protective floor.
    pub freeze_alpha: f64,
}

impl Limits {
    /// Extract the limits from a configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            initial_equity: config.initial_equity,
            period_limit: config.period_limit,
            lifetime_limit: config.lifetime_limit,
            target_profit_pct: config.target_profit_pct,
            freeze_alpha: config.freeze_alpha,
        }
    }

    /// Cumulative drawdown of `equity` from the initial equity.
    #[must_use]
    pub fn lifetime_drawdown(&self, equity: f64) -> f64 {
        1.0 - safe_div(equity, self.initial_equity)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Immutable per-step snapshot handed to every module.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    /// Global step index within the trial.
    pub step: u64,
    /// Current period index.
    pub period: u64,
    /// Current equity.
    pub equity: f64,
    /// High-water mark.
    pub hwm: f64,
    /// Equity at the start of the current period.
    pub period_start_equity: f64,
    /// Drawdown from HWM, `(hwm - equity) / hwm`.
    pub drawdown: f64,
    /// Cushion above the protective floor as a fraction of HWM; negative below the floor.
    pub cushion: f64,
    /// Realized per-step volatility estimate.
    pub realized_vol: f64,
    /// Realized P&L of the previous step (0 on the first step).
    pub last_pnl: f64,
    /// Final risk applied on the previous step.
    pub previous_risk: f64,
    /// Risk fraction requested upstream.
    pub requested_risk: f64,
    /// Configured limits.
    pub limits: Limits,
    /// Configured gating rules.
    pub gating: &'a GatingConfig,
}

impl<'a> PolicyContext<'a> {
    /// Build a context for the given equity path point, deriving drawdown and cushion.
    #[must_use]
    pub fn new(step: u64, equity: f64, hwm: f64, limits: Limits, gating: &'a GatingConfig) -> Self {
        let hwm = hwm.max(equity);
        let floor = hwm * (1.0 - limits.freeze_alpha);
        Self {
            step,
            period: 0,
            equity,
            hwm,
            period_start_equity: equity,
            drawdown: safe_div(hwm - equity, hwm),
            cushion: safe_div(equity - floor, hwm),
            realized_vol: 0.0,
            last_pnl: 0.0,
            previous_risk: 0.0,
            requested_risk: 0.0,
            limits,
            gating,
        }
    }

    /// Set the previous step's P&L and applied risk.
    #[must_use]
    pub const fn with_history(mut self, last_pnl: f64, previous_risk: f64) -> Self {
        self.last_pnl = last_pnl;
        self.previous_risk = previous_risk;
        self
    }

    /// Set the upstream requested risk.
    #[must_use]
    pub const fn with_requested_risk(mut self, requested_risk: f64) -> Self {
        self.requested_risk = requested_risk;
        self
    }

    /// Set the realized volatility estimate.
    #[must_use]
    pub const fn with_realized_vol(mut self, realized_vol: f64) -> Self {
        self.realized_vol = realized_vol;
        self
    }

    /// Set the period index and period-start equity.
    #[must_use]
    pub const fn with_period(mut self, period: u64, period_start_equity: f64) -> Self {
        self.period = period;
        self.period_start_equity = period_start_equity;
        self
    }

    /// Whether the previous step lost money.
    #[must_use]
    pub fn after_loss(&self) -> bool {
        self.last_pnl < 0.0
    }
}

/// A module's risk proposal for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyProposal {
    /// Proposed risk fraction in `[0, 1]`.
    pub risk: f64,
    /// Request to force the final risk to zero.
    pub freeze: bool,
    /// Diagnostic values; never read by the aggregator.
    pub notes: BTreeMap<&'static str, f64>,
}

impl PolicyProposal {
    /// Proposal of `risk`, clamped to `[0, 1]`.
    #[must_use]
    pub fn new(risk: f64) -> Self {
        Self {
            risk: clamp_unit(risk),
            freeze: false,
            notes: BTreeMap::new(),
        }
    }

    /// Zero proposal with the freeze flag set.
    #[must_use]
    pub fn frozen() -> Self {
        Self {
            risk: 0.0,
            freeze: true,
            notes: BTreeMap::new(),
        }
    }

    /// Attach a diagnostic note.
    #[must_use]
    pub fn with_note(mut self, key: &'static str, value: f64) -> Self {
        self.notes.insert(key, value);
        self
    }
}

/// What happened on a step, delivered to every module after P&L is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step index that produced this outcome.
    pub step: u64,
    /// Final risk fraction applied.
    pub applied_risk: f64,
    /// Raw return drawn from the generator.
    pub market_return: f64,
    /// Realized P&L.
    pub pnl: f64,
    /// Equity before the step.
    pub equity_before: f64,
    /// Equity after the step (floored).
    pub equity_after: f64,
    /// High-water mark after the step.
    pub hwm_after: f64,
    /// Cushion fraction after the step.
    pub cushion_after: f64,
    /// Whether this step closed the current period.
    pub period_rollover: bool,
}

impl StepOutcome {
    /// Portfolio return of the step, `pnl / equity_before`.
    #[must_use]
    pub fn portfolio_return(&self) -> f64 {
        safe_div(self.pnl, self.equity_before)
    }
}
