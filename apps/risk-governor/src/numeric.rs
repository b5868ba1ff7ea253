//! Numeric guards for floating-point risk arithmetic.
//!
//! Every division by a quantity that can approach zero (HWM, equity,
//! volatility) goes through [`safe_div`], and every value that leaves the
//! engine as a KPI goes through [`sanitize`]. Quantiles use linear
//! interpolation between ranks over finite values only.

/// Smallest denominator used by [`safe_div`].
pub const EPSILON: f64 = 1e-12;

/// Equity never drops below this value after a step.
pub const EQUITY_FLOOR: f64 = 1e-12;

/// Tolerance used when comparing proposals for the binding set.
pub const BINDING_TOLERANCE: f64 = 1e-12;

/// Divide `numerator` by `denominator`, flooring the denominator at [`EPSILON`].
///
/// Denominators in this crate are non-negative by construction (HWM, equity,
/// volatility), so the floor is applied to the value itself, not its magnitude.
#[must_use]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    numerator / denominator.max(EPSILON)
}

/// Clamp a risk fraction to `[0, 1]`.
///
/// Non-finite input maps to 0: an undefined risk value must never be read
/// as permission to trade.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Convert a computed value to a KPI, marking non-finite results unavailable.
#[must_use]
pub fn sanitize(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Quantile `q` of an ascending slice by linear interpolation between ranks.
///
/// Returns `None` for an empty slice.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let q = if q.is_finite() { q.clamp(0.0, 1.0) } else { 0.5 };
    let idx = q * (n - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = (idx.ceil() as usize).min(n - 1);
    if lo == hi {
        return Some(sorted[lo]);
    }
    let w = idx - lo as f64;
    Some(sorted[lo].mul_add(1.0 - w, sorted[hi] * w))
}

/// Finite values of `values`, sorted ascending.
#[must_use]
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut xs: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    xs.sort_by(f64::total_cmp);
    xs
}

/// Arithmetic mean; `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
