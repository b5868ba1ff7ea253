//! Soft barrier control points.

use serde::{Deserialize, Serialize};

/// One `(threshold, multiplier)` control point of the soft barrier curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrierLevel {
    /// Drawdown from HWM at which this multiplier applies.
    pub threshold: f64,
    /// Fraction of the requested risk allowed at this drawdown.
    pub multiplier: f64,
}

impl BarrierLevel {
    /// Create a control point.
    #[must_use]
    pub const fn new(threshold: f64, multiplier: f64) -> Self {
        Self {
            threshold,
            multiplier,
        }
    }
}

/// Soft barrier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftBarrierConfig {
    /// Control points; sorted by threshold before use.
    #[serde(default = "default_levels")]
    pub levels: Vec<BarrierLevel>,
}

impl Default for SoftBarrierConfig {
    fn default() -> Self {
        Self {
            levels: default_levels(),
        }
    }
}

impl SoftBarrierConfig {
    /// Control points sorted by ascending threshold.
    #[must_use]
    pub fn sorted_levels(&self) -> Vec<BarrierLevel> {
        let mut levels = self.levels.clone();
        levels.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        levels
    }
}

fn default_levels() -> Vec<BarrierLevel> {
    vec![
        BarrierLevel::new(0.0, 1.0),
        BarrierLevel::new(0.05, 0.75),
        BarrierLevel::new(0.10, 0.5),
        BarrierLevel::new(0.15, 0.25),
        BarrierLevel::new(0.20, 0.0),
    ]
}
