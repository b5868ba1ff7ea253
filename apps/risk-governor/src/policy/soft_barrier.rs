//! Piecewise-linear drawdown-to-multiplier curve.

use crate::config::{BarrierLevel, SoftBarrierConfig};

use super::types::{PolicyContext, PolicyProposal};

/// Stateless soft barrier policy.
#[derive(Debug, Clone)]
pub struct SoftBarrier {
    levels: Vec<BarrierLevel>,
}

impl SoftBarrier {
    /// Create a barrier from configured control points (sorted on construction).
    #[must_use]
    pub fn new(config: &SoftBarrierConfig) -> Self {
        Self {
            levels: config.sorted_levels(),
        }
    }

    /// Multiplier for a drawdown, interpolated between bracketing control points.
    ///
    /// Below the first threshold the first multiplier applies; beyond the last
    /// threshold the last multiplier applies. With no control points the
    /// multiplier is 0.
    #[must_use]
    pub fn multiplier(&self, drawdown: f64) -> f64 {
        let (Some(first), Some(last)) = (self.levels.first(), self.levels.last()) else {
            return 0.0;
        };
        if !drawdown.is_finite() {
            return last.multiplier;
        }
        if drawdown <= first.threshold {
            return first.multiplier;
        }
        if drawdown >= last.threshold {
            return last.multiplier;
        }

        for pair in self.levels.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if drawdown <= hi.threshold {
                let span = hi.threshold - lo.threshold;
                if span <= 0.0 {
                    return hi.multiplier;
                }
                let w = (drawdown - lo.threshold) / span;
                return (hi.multiplier - lo.multiplier).mul_add(w, lo.multiplier);
            }
        }
        last.multiplier
    }

    /// Propose `requested_risk * multiplier(drawdown)`.
    #[must_use]
    pub fn propose(&self, ctx: &PolicyContext<'_>) -> PolicyProposal {
        let multiplier = self.multiplier(ctx.drawdown);
        PolicyProposal::new(ctx.requested_risk * multiplier)
            .with_note("drawdown", ctx.drawdown)
            .with_note("multiplier", multiplier)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn barrier() -> SoftBarrier {
        SoftBarrier::new(&SoftBarrierConfig::default())
    }

    #[test_case(0.0, 1.0 ; "at first point")]
    #[test_case(0.025, 0.875 ; "halfway to second point")]
    #[test_case(0.05, 0.75 ; "at second point")]
    #[test_case(0.125, 0.375 ; "between third and fourth")]
    #[test_case(0.20, 0.0 ; "at last point")]
    #[test_case(0.50, 0.0 ; "beyond last point")]
    #[test_case(-0.01, 1.0 ; "below first point")]
    fn test_multiplier_interpolation(drawdown: f64, expected: f64) {
        let m = barrier().multiplier(drawdown);
        assert!((m - expected).abs() < 1e-12, "multiplier {m} != {expected}");
    }

    #[test]
    fn test_single_point_is_constant() {
        let b = SoftBarrier::new(&SoftBarrierConfig {
            levels: vec![BarrierLevel::new(0.1, 0.4)],
        });
        assert!((b.multiplier(0.0) - 0.4).abs() < f64::EPSILON);
        assert!((b.multiplier(0.3) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_levels_give_zero() {
        let b = SoftBarrier::new(&SoftBarrierConfig { levels: Vec::new() });
        assert_eq!(b.multiplier(0.05), 0.0);
    }

    #[test]
    fn test_multiplier_is_non_increasing_for_default_curve() {
        let b = barrier();
        let mut prev = f64::INFINITY;
        for i in 0..=300 {
            let m = b.multiplier(f64::from(i) * 0.001);
            assert!(m <= prev + 1e-12);
            prev = m;
        }
    }
}
