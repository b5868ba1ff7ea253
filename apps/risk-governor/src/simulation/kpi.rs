//! Trial KPIs computed from the equity path and per-step returns.
//!
//! Every KPI is `Option<f64>`: `None` marks a value that is undefined for
//! the trial (no losses for a downside ratio, empty path) or not finite.

use serde::{Deserialize, Serialize};

use crate::numeric::{mean, quantile_sorted, safe_div, sanitize, sorted_finite};

/// KPIs of one trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunKpis {
    /// Equity at termination.
    pub final_equity: Option<f64>,
    /// `final / initial - 1`.
    pub total_return: Option<f64>,
    /// Largest peak-to-trough decline as a fraction of the peak.
    pub max_drawdown: Option<f64>,
    /// Largest decline within a single period, measured from that period's
    /// running peak.
    pub max_period_drawdown: Option<f64>,
    /// Per-period compounded growth rate.
    pub growth_rate: Option<f64>,
    /// Mean step return over downside deviation.
    pub downside_risk_ratio: Option<f64>,
    /// Mean of step returns at or below their 5th percentile.
    pub es95: Option<f64>,
}

impl RunKpis {
    /// Compute every KPI for a finished trial.
    ///
    /// `equity_path` starts with the initial equity; `periods` is the number
    /// of periods the trial touched.
    #[must_use]
    pub fn compute(
        equity_path: &[f64],
        step_returns: &[f64],
        periods: u64,
        steps_per_period: u64,
    ) -> Self {
        let initial = equity_path.first().copied();
        let last = equity_path.last().copied();

        Self {
            final_equity: last.and_then(sanitize),
            total_return: initial
                .zip(last)
                .and_then(|(e0, e1)| sanitize(safe_div(e1, e0) - 1.0)),
            max_drawdown: max_drawdown(equity_path),
            max_period_drawdown: max_period_drawdown(equity_path, steps_per_period),
            growth_rate: initial
                .zip(last)
                .and_then(|(e0, e1)| growth_rate(e0, e1, periods)),
            downside_risk_ratio: downside_risk_ratio(step_returns),
            es95: es95(step_returns),
        }
    }
}

/// Largest decline from a running peak, as a fraction of that peak.
#[must_use]
pub fn max_drawdown(equity_path: &[f64]) -> Option<f64> {
    if equity_path.is_empty() {
        return None;
    }
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &equity in equity_path {
        peak = peak.max(equity);
        worst = worst.max(safe_div(peak - equity, peak));
    }
    sanitize(worst)
}

/// Worst intra-period drawdown.
///
/// Period `k` covers `equity_path[k * steps_per_period..=(k + 1) * steps_per_period]`:
/// its opening equity followed by the equity after each of its steps.
#[must_use]
pub fn max_period_drawdown(equity_path: &[f64], steps_per_period: u64) -> Option<f64> {
    let span = usize::try_from(steps_per_period).ok().filter(|s| *s > 0)?;
    let last = equity_path.len().checked_sub(1)?;

    let mut worst: f64 = 0.0;
    let mut start: usize = 0;
    loop {
        let end = start.saturating_add(span).min(last);
        worst = worst.max(max_drawdown(&equity_path[start..=end])?);
        if end == last {
            break;
        }
        start = end;
    }
    Some(worst)
}

/// Compounded growth rate per period, `(e1 / e0)^(1 / periods) - 1`.
#[must_use]
pub fn growth_rate(e0: f64, e1: f64, periods: u64) -> Option<f64> {
    if e0 <= 0.0 || e1 <= 0.0 || periods == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let horizon = periods as f64;
    sanitize((e1 / e0).powf(1.0 / horizon) - 1.0)
}

/// Mean return over downside deviation (root mean square of negative returns
/// over all steps). `None` when there are no losing steps.
#[must_use]
pub fn downside_risk_ratio(returns: &[f64]) -> Option<f64> {
    let avg = mean(returns)?;
    let downside_sq: f64 = returns.iter().map(|r| r.min(0.0).powi(2)).sum();
    #[allow(clippy::cast_precision_loss)]
    let downside = (downside_sq / returns.len() as f64).sqrt();
    if downside <= 0.0 {
        return None;
    }
    sanitize(avg / downside)
}

/// Expected shortfall at 95%: mean of returns at or below the 5th percentile.
#[must_use]
pub fn es95(returns: &[f64]) -> Option<f64> {
    let sorted = sorted_finite(returns);
    let cutoff = quantile_sorted(&sorted, 0.05)?;
    let tail: Vec<f64> = sorted.iter().copied().filter(|r| *r <= cutoff).collect();
    mean(&tail).and_then(sanitize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_drawdown() {
        let path = [1.0, 1.1, 0.99, 1.05, 0.88, 1.2];
        let Some(dd) = max_drawdown(&path) else {
            panic!("drawdown of non-empty path");
        };
        assert!((dd - 0.2).abs() < 1e-12);
        assert_eq!(max_drawdown(&[]), None);
        assert_eq!(max_drawdown(&[1.0, 1.1, 1.2]), Some(0.0));
    }

    #[test]
    fn test_max_period_drawdown_resets_peak_each_period() {
        let path = [1.0, 1.1, 0.99, 1.05, 0.88, 1.2];
        let expected = (1.05 - 0.88) / 1.05;

        let by_two = max_period_drawdown(&path, 2);
        assert!(by_two.is_some_and(|dd| (dd - expected).abs() < 1e-12));

        let by_one = max_period_drawdown(&path, 1);
        assert!(by_one.is_some_and(|dd| (dd - expected).abs() < 1e-12));

        // One period spans the whole decline from 1.1 to 0.88.
        let by_five = max_period_drawdown(&path, 5);
        assert!(by_five.is_some_and(|dd| (dd - 0.2).abs() < 1e-12));
    }

    #[test]
    fn test_max_period_drawdown_edge_cases() {
        assert_eq!(max_period_drawdown(&[], 3), None);
        assert_eq!(max_period_drawdown(&[1.0, 0.9], 0), None);
        assert_eq!(max_period_drawdown(&[1.0], 3), Some(0.0));
        assert_eq!(max_period_drawdown(&[1.0, 1.1, 1.2, 1.3], 2), Some(0.0));
    }

    #[test]
    fn test_growth_rate() {
        let Some(g) = growth_rate(1.0, 1.21, 2) else {
            panic!("growth rate should be defined");
        };
        assert!((g - 0.1).abs() < 1e-12);
        assert_eq!(growth_rate(1.0, 1.1, 0), None);
        assert_eq!(growth_rate(0.0, 1.1, 3), None);
    }

    #[test]
    fn test_downside_ratio() {
        assert_eq!(downside_risk_ratio(&[0.01, 0.02]), None);
        assert_eq!(downside_risk_ratio(&[]), None);

        let Some(ratio) = downside_risk_ratio(&[0.02, -0.01, 0.02, -0.01]) else {
            panic!("ratio should be defined with losses");
        };
        // mean 0.005, downside sqrt(0.0002 / 4) ~ 0.00707
        assert!((ratio - 0.005 / (0.0002_f64 / 4.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_es95_uses_lower_tail() {
        let returns: Vec<f64> = (1..=100).map(|i| f64::from(i) / 100.0 - 0.5).collect();
        let Some(es) = es95(&returns) else {
            panic!("es95 should be defined");
        };
        // 5th percentile = -0.4405; tail = -0.49..=-0.45
        assert!((es - (-0.47)).abs() < 1e-9);
        assert_eq!(es95(&[]), None);
    }

    #[test]
    fn test_compute_full_kpis() {
        let kpis = RunKpis::compute(&[1.0, 1.05, 1.1], &[0.05, 0.047_619], 2, 1);
        assert_eq!(kpis.final_equity, Some(1.1));
        assert!(kpis.total_return.is_some_and(|r| (r - 0.1).abs() < 1e-12));
        assert_eq!(kpis.max_drawdown, Some(0.0));
        assert_eq!(kpis.max_period_drawdown, Some(0.0));
        assert_eq!(kpis.downside_risk_ratio, None);
    }
}
