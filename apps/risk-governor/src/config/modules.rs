//! Enabled-module flags.

use serde::{Deserialize, Serialize};

/// Which policy modules take part in aggregation.
///
/// Modules are always registered in the fixed order freeze, budget gate,
/// soft barrier, volatility target; a disabled module is simply skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// Hysteresis freeze on the drawdown cushion.
    #[serde(default = "default_true")]
    pub freeze: bool,
    /// Period and lifetime loss budgets.
    #[serde(default = "default_true")]
    pub budget_gate: bool,
    /// Drawdown-to-multiplier curve.
    #[serde(default = "default_true")]
    pub soft_barrier: bool,
    /// Volatility targeting on realized portfolio returns.
    #[serde(default)]
    pub vol_target: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            freeze: true,
            budget_gate: true,
            soft_barrier: true,
            vol_target: false,
        }
    }
}

impl ModulesConfig {
    /// Number of enabled modules.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        [self.freeze, self.budget_gate, self.soft_barrier, self.vol_target]
            .into_iter()
            .filter(|enabled| *enabled)
            .count()
    }
}

pub(crate) const fn default_true() -> bool {
    true
}
