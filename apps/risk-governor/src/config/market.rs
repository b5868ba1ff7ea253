//! Return generator configuration.

use serde::{Deserialize, Serialize};

/// Distribution of per-step shocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    /// Standard normal shocks.
    #[default]
    Gaussian,
    /// Student-t shocks rescaled to unit variance.
    StudentT,
    /// Standard normal shocks, widened by `tail_mult` with probability
    /// `p_tail`. Not variance-matched: the shock variance is
    /// `1 + p_tail * (tail_mult^2 - 1)`.
    Mixture,
}

/// Scale mixture used by [`SamplerKind::Mixture`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixtureConfig {
    /// Probability that a step draws from the wide component.
    #[serde(default = "default_p_tail")]
    pub p_tail: f64,
    /// Volatility multiplier of the wide component.
    #[serde(default = "default_tail_mult")]
    pub tail_mult: f64,
}

impl Default for MixtureConfig {
    fn default() -> Self {
        Self {
            p_tail: default_p_tail(),
            tail_mult: default_tail_mult(),
        }
    }
}

/// Jump overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpConfig {
    /// Whether jumps are added.
    #[serde(default)]
    pub enabled: bool,
    /// Per-step jump probability.
    #[serde(default = "default_jump_probability")]
    pub probability: f64,
    /// Standard deviation of a jump.
    #[serde(default = "default_jump_sigma")]
    pub sigma: f64,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            probability: default_jump_probability(),
            sigma: default_jump_sigma(),
        }
    }
}

/// EWMA volatility clustering.
///
/// When enabled, the per-step sigma follows
/// `sigma_t^2 = lambda * sigma_{t-1}^2 + (1 - lambda) * (shock * |eps_t|)^2`
/// with `eps_t` standard normal, starting from the base sigma.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolClusterConfig {
    /// Whether clustering is active.
    #[serde(default)]
    pub enabled: bool,
    /// Persistence of the variance process.
    #[serde(default = "default_cluster_lambda")]
    pub lambda: f64,
    /// Scale of the innovation term.
    #[serde(default = "default_cluster_shock")]
    pub shock: f64,
}

impl Default for VolClusterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lambda: default_cluster_lambda(),
            shock: default_cluster_shock(),
        }
    }
}

/// Parameters of the sampled return generator.
///
/// Returns are outcomes per unit of capital at risk, so a step's P&L is
/// `equity * risk * return`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnModelConfig {
    /// Shock distribution.
    #[serde(default)]
    pub sampler: SamplerKind,
    /// Per-step drift.
    #[serde(default = "default_mu")]
    pub mu: f64,
    /// Per-step volatility; 0 gives the deterministic drift.
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    /// Degrees of freedom of the Student-t sampler.
    #[serde(default = "default_nu")]
    pub nu: f64,
    /// Tail component of the mixture sampler.
    #[serde(default)]
    pub mixture: MixtureConfig,
    /// Jump overlay.
    #[serde(default)]
    pub jumps: JumpConfig,
    /// Volatility clustering.
    #[serde(default)]
    pub vol_cluster: VolClusterConfig,
}

impl Default for ReturnModelConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerKind::default(),
            mu: default_mu(),
            sigma: default_sigma(),
            nu: default_nu(),
            mixture: MixtureConfig::default(),
            jumps: JumpConfig::default(),
            vol_cluster: VolClusterConfig::default(),
        }
    }
}

const fn default_mu() -> f64 {
    0.1
}
const fn default_sigma() -> f64 {
    1.0
}
const fn default_nu() -> f64 {
    4.0
}
const fn default_p_tail() -> f64 {
    0.10
}
const fn default_tail_mult() -> f64 {
    3.0
}
const fn default_jump_probability() -> f64 {
    0.02
}
const fn default_jump_sigma() -> f64 {
    3.0
}
const fn default_cluster_lambda() -> f64 {
    0.94
}
const fn default_cluster_shock() -> f64 {
    1.0
}
