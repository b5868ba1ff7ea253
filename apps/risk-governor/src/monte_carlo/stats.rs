//! Batch statistics: Wilson score interval and KPI quantile summaries.

use serde::{Deserialize, Serialize};

use crate::numeric::{mean, quantile_sorted, sorted_finite};

// Acklam's rational approximation of the inverse normal CDF.
const ACKLAM_A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_69e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const ACKLAM_B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
const ACKLAM_C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const ACKLAM_D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];
const ACKLAM_P_LOW: f64 = 0.024_25;

fn polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, c| acc.mul_add(x, *c))
}

fn tail_quantile(q: f64) -> f64 {
    polynomial(&ACKLAM_C, q) / polynomial(&ACKLAM_D, q).mul_add(q, 1.0)
}

/// Inverse of the standard normal CDF for `p` in `(0, 1)`.
///
/// Relative error below `1.2e-9`. Returns NaN outside the open unit interval.
#[must_use]
pub fn inverse_normal_cdf(p: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }
    if p < ACKLAM_P_LOW {
        tail_quantile((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - ACKLAM_P_LOW {
        let q = p - 0.5;
        let r = q * q;
        polynomial(&ACKLAM_A, r) * q / polynomial(&ACKLAM_B, r).mul_add(r, 1.0)
    } else {
        -tail_quantile((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

/// Two-sided normal critical value for a confidence level.
#[must_use]
pub fn z_from_confidence(confidence: f64) -> f64 {
    inverse_normal_cdf(1.0 - (1.0 - confidence) / 2.0)
}

/// Wilson score interval for `k` successes out of `n` trials.
///
/// Bounds satisfy `0 <= lower <= k/n <= upper <= 1`. With no trials the
/// interval is the uninformative `[0, 1]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn wilson_interval(k: u64, n: u64, confidence: f64) -> (f64, f64) {
    if n == 0 {
        return (0.0, 1.0);
    }
    let z = z_from_confidence(confidence);
    let n_f = n as f64;
    let p = (k.min(n) as f64) / n_f;
    let z2 = z * z;

    let denom = 1.0 + z2 / n_f;
    let center = (p + z2 / (2.0 * n_f)) / denom;
    let half = z * (p * (1.0 - p) / n_f + z2 / (4.0 * n_f * n_f)).sqrt() / denom;

    let lower = (center - half).max(0.0).min(p);
    let upper = (center + half).min(1.0).max(p);
    (lower, upper)
}

/// Distribution summary of one KPI across valid trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileSummary {
    /// Number of trials with an available value.
    pub count: u64,
    /// Smallest value.
    pub min: f64,
    /// 5th percentile.
    pub p05: f64,
    /// 25th percentile.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 95th percentile.
    pub p95: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
}

impl QuantileSummary {
    /// Summarize the finite entries of `values`; `None` when there are none.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let q = |level| quantile_sorted(&sorted, level);
        Some(Self {
            count: sorted.len() as u64,
            min: *sorted.first()?,
            p05: q(0.05)?,
            p25: q(0.25)?,
            p50: q(0.50)?,
            p75: q(0.75)?,
            p95: q(0.95)?,
            max: *sorted.last()?,
            mean: mean(&sorted)?,
        })
    }
}
