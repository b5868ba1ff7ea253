//! Aggregated result of a Monte Carlo batch.
//!
//! Every statistic is computed from the trial outcomes sorted by seed, so the
//! result does not depend on the order in which workers finished.

use serde::{Deserialize, Serialize};

use crate::numeric::{mean, safe_div};
use crate::simulation::{RunKpis, TerminationReason, TrialError, TrialSummary};

use super::stats::{QuantileSummary, wilson_interval};

/// Outcome of one trial as seen by the harness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialOutcome {
    /// The trial ran to termination.
    Completed(TrialSummary),
    /// The trial hit a non-finite value and is excluded from statistics.
    Invalid {
        /// Seed of the trial.
        seed: u64,
        /// Failure.
        error: TrialError,
    },
}

impl TrialOutcome {
    /// Seed of the trial.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        match self {
            Self::Completed(summary) => summary.seed,
            Self::Invalid { seed, .. } => *seed,
        }
    }
}

/// Trial counts per termination reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationBreakdown {
    /// Trials that reached the profit target.
    pub target_hit: u64,
    /// Trials stopped by the lifetime limit.
    pub lifetime_breach: u64,
    /// Trials that ran out of steps or periods.
    pub max_length: u64,
}

impl TerminationBreakdown {
    fn count(&mut self, reason: TerminationReason) {
        match reason {
            TerminationReason::TargetHit => self.target_hit += 1,
            TerminationReason::LifetimeBreach => self.lifetime_breach += 1,
            TerminationReason::MaxLength => self.max_length += 1,
        }
    }
}

/// Quantile summaries per KPI; `None` when no valid trial had the KPI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiQuantiles {
    /// Final equity.
    pub final_equity: Option<QuantileSummary>,
    /// Total return.
    pub total_return: Option<QuantileSummary>,
    /// Maximum drawdown.
    pub max_drawdown: Option<QuantileSummary>,
    /// Worst drawdown within a single period.
    pub max_period_drawdown: Option<QuantileSummary>,
    /// Per-period growth rate.
    pub growth_rate: Option<QuantileSummary>,
    /// Downside risk ratio.
    pub downside_risk_ratio: Option<QuantileSummary>,
    /// Expected shortfall at 95%.
    pub es95: Option<QuantileSummary>,
    /// Steps executed.
    pub steps: Option<QuantileSummary>,
    /// Periods needed to reach the target, over trials that reached it.
    pub periods_to_target: Option<QuantileSummary>,
}

impl KpiQuantiles {
    #[allow(clippy::cast_precision_loss)]
    fn from_summaries(trials: &[TrialSummary]) -> Self {
        let column = |select: fn(&RunKpis) -> Option<f64>| {
            let values: Vec<f64> = trials.iter().filter_map(|t| select(&t.kpis)).collect();
            QuantileSummary::from_values(&values)
        };
        let steps: Vec<f64> = trials.iter().map(|t| t.steps as f64).collect();
        let periods_to_target: Vec<f64> = trials
            .iter()
            .filter_map(|t| t.periods_to_target)
            .map(|p| p as f64)
            .collect();

        Self {
            final_equity: column(|k| k.final_equity),
            total_return: column(|k| k.total_return),
            max_drawdown: column(|k| k.max_drawdown),
            max_period_drawdown: column(|k| k.max_period_drawdown),
            growth_rate: column(|k| k.growth_rate),
            downside_risk_ratio: column(|k| k.downside_risk_ratio),
            es95: column(|k| k.es95),
            steps: QuantileSummary::from_values(&steps),
            periods_to_target: QuantileSummary::from_values(&periods_to_target),
        }
    }
}

/// Trial excluded from the statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidTrial {
    /// Seed of the trial.
    pub seed: u64,
    /// Step at which it failed.
    pub step: u64,
    /// Failure description.
    pub reason: String,
}

/// Result of a Monte Carlo batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Trials requested.
    pub n_trials: u64,
    /// Trials that ran (valid or invalid); less than requested on cancel.
    pub completed: u64,
    /// Trials excluded for numeric failure.
    pub invalid: u64,
    /// Passing trials.
    pub passes: u64,
    /// `passes / valid trials`.
    pub pass_rate: f64,
    /// Lower Wilson bound on the pass probability.
    pub ci_lower: f64,
    /// Upper Wilson bound on the pass probability.
    pub ci_upper: f64,
    /// Confidence level of the interval.
    pub confidence: f64,
    /// Valid trials per termination reason.
    pub terminations: TerminationBreakdown,
    /// Valid trials with at least one period breach.
    pub period_breach_trials: u64,
    /// Mean steps to target among passing trials.
    pub mean_steps_to_target: Option<f64>,
    /// Mean periods to target among passing trials.
    pub mean_periods_to_target: Option<f64>,
    /// KPI distributions over valid trials.
    pub kpis: KpiQuantiles,
    /// Per-trial summaries ordered by seed (empty when not kept).
    pub trials: Vec<TrialSummary>,
    /// Trials excluded for numeric failure, ordered by seed.
    pub invalid_trials: Vec<InvalidTrial>,
    /// Whether the batch was cancelled before every trial ran.
    pub cancelled: bool,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl MonteCarloResult {
    /// Aggregate trial outcomes.
    ///
    /// Outcomes may arrive in any order.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_outcomes(
        n_trials: u64,
        confidence: f64,
        mut outcomes: Vec<TrialOutcome>,
        keep_trials: bool,
    ) -> Self {
        outcomes.sort_by_key(TrialOutcome::seed);

        let mut trials = Vec::with_capacity(outcomes.len());
        let mut invalid_trials = Vec::new();
        for outcome in &outcomes {
            match outcome {
                TrialOutcome::Completed(summary) => trials.push(*summary),
                TrialOutcome::Invalid { seed, error } => invalid_trials.push(InvalidTrial {
                    seed: *seed,
                    step: error.step(),
                    reason: error.to_string(),
                }),
            }
        }

        let valid = trials.len() as u64;
        let passes = trials.iter().filter(|t| t.passed).count() as u64;
        let (ci_lower, ci_upper) = wilson_interval(passes, valid, confidence);

        let mut terminations = TerminationBreakdown::default();
        for trial in &trials {
            terminations.count(trial.termination);
        }
        let passing_mean = |select: fn(&TrialSummary) -> Option<u64>| {
            let values: Vec<f64> = trials
                .iter()
                .filter(|t| t.passed)
                .filter_map(select)
                .map(|v| v as f64)
                .collect();
            mean(&values)
        };

        Self {
            n_trials,
            completed: outcomes.len() as u64,
            invalid: invalid_trials.len() as u64,
            passes,
            pass_rate: safe_div(passes as f64, valid as f64),
            ci_lower,
            ci_upper,
            confidence,
            terminations,
            period_breach_trials: trials.iter().filter(|t| t.period_breaches > 0).count() as u64,
            mean_steps_to_target: passing_mean(|t| t.steps_to_target),
            mean_periods_to_target: passing_mean(|t| t.periods_to_target),
            kpis: KpiQuantiles::from_summaries(&trials),
            trials: if keep_trials { trials } else { Vec::new() },
            invalid_trials,
            cancelled: (outcomes.len() as u64) < n_trials,
            duration_ms: 0,
        }
    }

    /// Trials that contributed to the statistics.
    #[must_use]
    pub const fn valid(&self) -> u64 {
        self.completed - self.invalid
    }
}
