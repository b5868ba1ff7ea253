//! Configuration module for the risk governor.
//!
//! A single flat structure carries the loss limits, budget-gate, freeze and
//! trial-length options; nested sections carry the enabled-module flags,
//! soft-barrier curve, gating rules, return model, harness and logging
//! settings. Unknown keys are ignored and missing keys fall back to the
//! documented defaults.
//!
//! # Usage
//!
//! ```rust,ignore
//! use risk_governor::config::{Config, load_config};
//!
//! // Load from default path (risk.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("presets/aggressive.yaml"))?;
//!
//! println!("period limit: {}", config.period_limit);
//! ```

mod barrier;
mod gating;
mod harness;
mod market;
mod modules;
mod observability;
mod validation;
mod vol_target;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use barrier::{BarrierLevel, SoftBarrierConfig};
pub use gating::{GatingConfig, SessionMask, StepWindow};
pub use harness::HarnessConfig;
pub use market::{JumpConfig, MixtureConfig, ReturnModelConfig, SamplerKind, VolClusterConfig};
pub use modules::ModulesConfig;
pub use observability::{LogFormat, LoggingConfig, ObservabilityConfig};
pub use validation::validate_config;
pub use vol_target::{VolTargetConfig, ewma_lambda};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Failed to parse JSON configuration.
    #[error("Failed to parse config JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A configuration field holds an invalid value.
    #[error("Invalid config field '{field}': {reason}")]
    InvalidField {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, if this is a validation error.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Starting equity of every trial.
    #[serde(default = "default_initial_equity")]
    pub initial_equity: f64,
    /// Risk fraction requested by the upstream sizing process each step.
    #[serde(default = "default_requested_risk")]
    pub requested_risk: f64,

    /// Maximum loss per period, as a fraction of period-start equity.
    #[serde(default = "default_period_limit")]
    pub period_limit: f64,
    /// Maximum cumulative loss, as a fraction of initial equity.
    #[serde(default = "default_lifetime_limit")]
    pub lifetime_limit: f64,
    /// Share of the remaining period budget that may be spent in one step.
    #[serde(default = "default_pacing_rate")]
    pub pacing_rate: f64,
    /// Exposure cap when realized volatility is at or below the reference.
    #[serde(default = "default_exposure_cap_base")]
    pub exposure_cap_base: f64,
    /// Floor of the volatility-tightened exposure cap.
    #[serde(default = "default_exposure_cap_min")]
    pub exposure_cap_min: f64,
    /// Reference per-step volatility for the exposure cap.
    #[serde(default = "default_reference_vol")]
    pub reference_vol: f64,
    /// Half-life (steps) of the realized-volatility EMA.
    #[serde(default = "default_vol_halflife")]
    pub vol_halflife: u32,

    /// Drawdown tolerance; the protective floor is `HWM * (1 - freeze_alpha)`.
    #[serde(default = "default_freeze_alpha")]
    pub freeze_alpha: f64,
    /// Enter the frozen state when cushion/HWM falls below this value.
    #[serde(default = "default_freeze_in_pct")]
    pub freeze_in_pct: f64,
    /// Leave the frozen state when cushion/HWM rises above this value.
    #[serde(default = "default_freeze_out_pct")]
    pub freeze_out_pct: f64,
    /// Multiplier applied to the cushion fraction while active.
    #[serde(default = "default_freeze_gain")]
    pub freeze_gain: f64,
    /// Hard ceiling of the freeze policy's proposal.
    #[serde(default = "default_freeze_ceiling")]
    pub freeze_ceiling: f64,
    /// EMA weight of the newest cushion observation (None = no smoothing).
    #[serde(default)]
    pub freeze_smoothing: Option<f64>,

    /// Profit target, as a fraction of initial equity.
    #[serde(default = "default_target_profit_pct")]
    pub target_profit_pct: f64,
    /// Maximum number of steps in one trial.
    #[serde(default = "default_max_trial_steps")]
    pub max_trial_steps: u64,
    /// Steps that make up one budget period (e.g. one trading day).
    #[serde(default = "default_steps_per_period")]
    pub steps_per_period: u64,
    /// Maximum number of periods in one trial.
    #[serde(default = "default_max_periods")]
    pub max_periods: u64,

    /// Enabled policy modules.
    #[serde(default)]
    pub modules: ModulesConfig,
    /// Soft barrier control points.
    #[serde(default)]
    pub soft_barrier: SoftBarrierConfig,
    /// Volatility target parameters.
    #[serde(default)]
    pub vol_target: VolTargetConfig,
    /// External gating rules.
    #[serde(default)]
    pub gating: GatingConfig,
    /// Return generator parameters.
    #[serde(default)]
    pub market: ReturnModelConfig,
    /// Monte Carlo harness settings.
    #[serde(default)]
    pub harness: HarnessConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_equity: default_initial_equity(),
            requested_risk: default_requested_risk(),
            period_limit: default_period_limit(),
            lifetime_limit: default_lifetime_limit(),
            pacing_rate: default_pacing_rate(),
            exposure_cap_base: default_exposure_cap_base(),
            exposure_cap_min: default_exposure_cap_min(),
            reference_vol: default_reference_vol(),
            vol_halflife: default_vol_halflife(),
            freeze_alpha: default_freeze_alpha(),
            freeze_in_pct: default_freeze_in_pct(),
            freeze_out_pct: default_freeze_out_pct(),
            freeze_gain: default_freeze_gain(),
            freeze_ceiling: default_freeze_ceiling(),
            freeze_smoothing: None,
            target_profit_pct: default_target_profit_pct(),
            max_trial_steps: default_max_trial_steps(),
            steps_per_period: default_steps_per_period(),
            max_periods: default_max_periods(),
            modules: ModulesConfig::default(),
            soft_barrier: SoftBarrierConfig::default(),
            vol_target: VolTargetConfig::default(),
            gating: GatingConfig::default(),
            market: ReturnModelConfig::default(),
            harness: HarnessConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Validate every field, failing on the first offending one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the rejected field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_config(self)
    }

    /// Equity level at which the profit target is reached.
    #[must_use]
    pub fn target_equity(&self) -> f64 {
        self.initial_equity * (1.0 + self.target_profit_pct)
    }

    /// Equity level below which the lifetime limit is breached.
    #[must_use]
    pub fn lifetime_floor(&self) -> f64 {
        self.initial_equity * (1.0 - self.lifetime_limit)
    }
}

const fn default_initial_equity() -> f64 {
    1.0
}
const fn default_requested_risk() -> f64 {
    0.01
}
const fn default_period_limit() -> f64 {
    0.02
}
const fn default_lifetime_limit() -> f64 {
    0.10
}
const fn default_pacing_rate() -> f64 {
    0.33
}
const fn default_exposure_cap_base() -> f64 {
    0.02
}
const fn default_exposure_cap_min() -> f64 {
    0.005
}
const fn default_reference_vol() -> f64 {
    0.01
}
const fn default_vol_halflife() -> u32 {
    10
}
const fn default_freeze_alpha() -> f64 {
    0.10
}
const fn default_freeze_in_pct() -> f64 {
    0.05
}
const fn default_freeze_out_pct() -> f64 {
    0.08
}
const fn default_freeze_gain() -> f64 {
    1.0
}
const fn default_freeze_ceiling() -> f64 {
    0.02
}
const fn default_target_profit_pct() -> f64 {
    0.10
}
const fn default_max_trial_steps() -> u64 {
    1000
}
const fn default_steps_per_period() -> u64 {
    1
}
const fn default_max_periods() -> u64 {
    30
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "risk.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("risk.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a JSON document.
///
/// # Errors
///
/// Returns a `ConfigError` if the JSON cannot be parsed or validated.
pub fn load_config_from_json(json: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}
