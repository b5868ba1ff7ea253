//! Result of a single trial.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::kpi::RunKpis;

/// Why a trial stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Equity reached the profit target.
    TargetHit,
    /// Equity fell below the lifetime floor.
    LifetimeBreach,
    /// The step or period limit was reached.
    MaxLength,
}

impl TerminationReason {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TargetHit => "target_hit",
            Self::LifetimeBreach => "lifetime_breach",
            Self::MaxLength => "max_length",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full record of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Seed the trial ran with.
    pub seed: u64,
    /// Equity after every step, starting with the initial equity.
    pub equity_path: Vec<f64>,
    /// Final risk applied on every step.
    pub risk_path: Vec<f64>,
    /// Number of periods with a period-limit breach.
    pub period_breaches: u64,
    /// Number of lifetime breaches (0 or 1).
    pub lifetime_breaches: u64,
    /// Step at which the target was reached.
    pub target_hit_step: Option<u64>,
    /// Periods needed to reach the target (1-based), if it was reached.
    pub periods_to_target: Option<u64>,
    /// Why the trial stopped.
    pub termination: TerminationReason,
    /// Steps executed.
    pub steps: u64,
    /// Periods touched.
    pub periods: u64,
    /// Number of budget resets performed by the budget gate.
    pub budget_resets: u64,
    /// Whether the trial met every pass criterion.
    pub passed: bool,
    /// Trial KPIs.
    pub kpis: RunKpis,
}

impl RunResult {
    /// Steps needed to reach the target (1-based), if it was reached.
    #[must_use]
    pub fn steps_to_target(&self) -> Option<u64> {
        self.target_hit_step.map(|s| s + 1)
    }

    /// Lightweight summary without the paths.
    #[must_use]
    pub fn summary(&self) -> TrialSummary {
        TrialSummary {
            seed: self.seed,
            passed: self.passed,
            termination: self.termination,
            steps: self.steps,
            period_breaches: self.period_breaches,
            steps_to_target: self.steps_to_target(),
            periods_to_target: self.periods_to_target,
            kpis: self.kpis,
        }
    }
}

/// Per-trial summary kept by the Monte Carlo harness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Seed the trial ran with.
    pub seed: u64,
    /// Whether the trial passed.
    pub passed: bool,
    /// Why the trial stopped.
    pub termination: TerminationReason,
    /// Steps executed.
    pub steps: u64,
    /// Number of periods with a period-limit breach.
    pub period_breaches: u64,
    /// Steps needed to reach the target.
    pub steps_to_target: Option<u64>,
    /// Periods needed to reach the target.
    pub periods_to_target: Option<u64>,
    /// Trial KPIs.
    pub kpis: RunKpis,
}
