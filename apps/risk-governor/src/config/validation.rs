//! Configuration validation, run once before any trial.
//!
//! Invalid values are rejected with the dotted name of the first offending
//! field. Nothing is auto-corrected.

use super::{Config, ConfigError, GatingConfig, ReturnModelConfig, SamplerKind, SoftBarrierConfig};

/// Validate a loaded configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for the first field that fails.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    positive("initial_equity", config.initial_equity)?;
    in_closed_unit("requested_risk", config.requested_risk)?;

    in_open_unit("period_limit", config.period_limit)?;
    in_open_unit("lifetime_limit", config.lifetime_limit)?;
    positive("target_profit_pct", config.target_profit_pct)?;

    finite("pacing_rate", config.pacing_rate)?;
    if config.pacing_rate <= 0.0 || config.pacing_rate > 1.0 {
        return Err(ConfigError::invalid("pacing_rate", "must be in (0, 1]"));
    }

    in_closed_unit("exposure_cap_base", config.exposure_cap_base)?;
    in_closed_unit("exposure_cap_min", config.exposure_cap_min)?;
    if config.exposure_cap_min > config.exposure_cap_base {
        return Err(ConfigError::invalid(
            "exposure_cap_min",
            format!(
                "must not exceed exposure_cap_base ({})",
                config.exposure_cap_base
            ),
        ));
    }
    positive("reference_vol", config.reference_vol)?;

    in_open_unit("freeze_alpha", config.freeze_alpha)?;
    finite("freeze_in_pct", config.freeze_in_pct)?;
    finite("freeze_out_pct", config.freeze_out_pct)?;
    if config.freeze_out_pct <= config.freeze_in_pct {
        return Err(ConfigError::invalid(
            "freeze_out_pct",
            format!(
                "must be greater than freeze_in_pct ({})",
                config.freeze_in_pct
            ),
        ));
    }
    finite("freeze_gain", config.freeze_gain)?;
    if config.freeze_gain < 0.0 {
        return Err(ConfigError::invalid("freeze_gain", "must be non-negative"));
    }
    finite("freeze_ceiling", config.freeze_ceiling)?;
    if config.freeze_ceiling <= 0.0 || config.freeze_ceiling > 1.0 {
        return Err(ConfigError::invalid("freeze_ceiling", "must be in (0, 1]"));
    }
    if let Some(weight) = config.freeze_smoothing {
        if !weight.is_finite() || weight <= 0.0 || weight > 1.0 {
            return Err(ConfigError::invalid("freeze_smoothing", "must be in (0, 1]"));
        }
    }

    if config.max_trial_steps == 0 {
        return Err(ConfigError::invalid("max_trial_steps", "must be at least 1"));
    }
    if config.steps_per_period == 0 {
        return Err(ConfigError::invalid("steps_per_period", "must be at least 1"));
    }
    if config.max_periods == 0 {
        return Err(ConfigError::invalid("max_periods", "must be at least 1"));
    }

    validate_soft_barrier(&config.soft_barrier)?;
    positive("vol_target.target_vol", config.vol_target.target_vol)?;
    validate_gating(&config.gating)?;
    validate_market(&config.market)?;

    let confidence = config.harness.confidence;
    if !confidence.is_finite() || confidence <= 0.0 || confidence >= 1.0 {
        return Err(ConfigError::invalid("harness.confidence", "must be in (0, 1)"));
    }

    Ok(())
}

fn validate_soft_barrier(barrier: &SoftBarrierConfig) -> Result<(), ConfigError> {
    if barrier.levels.is_empty() {
        return Err(ConfigError::invalid(
            "soft_barrier.levels",
            "at least one control point is required",
        ));
    }
    for (i, level) in barrier.levels.iter().enumerate() {
        finite(&format!("soft_barrier.levels[{i}].threshold"), level.threshold)?;
        if level.threshold < 0.0 {
            return Err(ConfigError::invalid(
                format!("soft_barrier.levels[{i}].threshold"),
                "must be non-negative",
            ));
        }
        in_closed_unit(
            &format!("soft_barrier.levels[{i}].multiplier"),
            level.multiplier,
        )?;
    }
    Ok(())
}

fn validate_gating(gating: &GatingConfig) -> Result<(), ConfigError> {
    if let Some(cap) = gating.risk_cap {
        in_closed_unit("gating.risk_cap", cap)?;
    }
    for (i, window) in gating.blackout_windows.iter().enumerate() {
        if window.end < window.start {
            return Err(ConfigError::invalid(
                format!("gating.blackout_windows[{i}]"),
                "end must not precede start",
            ));
        }
    }
    if let Some(session) = &gating.session {
        if session.period_len == 0 {
            return Err(ConfigError::invalid(
                "gating.session.period_len",
                "must be at least 1",
            ));
        }
        for (i, window) in session.allow.iter().enumerate() {
            if window.end < window.start {
                return Err(ConfigError::invalid(
                    format!("gating.session.allow[{i}]"),
                    "end must not precede start",
                ));
            }
        }
    }
    Ok(())
}

fn validate_market(market: &ReturnModelConfig) -> Result<(), ConfigError> {
    finite("market.mu", market.mu)?;
    finite("market.sigma", market.sigma)?;
    if market.sigma < 0.0 {
        return Err(ConfigError::invalid("market.sigma", "must be non-negative"));
    }
    if market.sampler == SamplerKind::StudentT && !(market.nu.is_finite() && market.nu > 2.0) {
        return Err(ConfigError::invalid(
            "market.nu",
            "must be greater than 2 for the student_t sampler",
        ));
    }
    if market.sampler == SamplerKind::Mixture {
        in_closed_unit("market.mixture.p_tail", market.mixture.p_tail)?;
        positive("market.mixture.tail_mult", market.mixture.tail_mult)?;
    }
    if market.jumps.enabled {
        in_closed_unit("market.jumps.probability", market.jumps.probability)?;
        finite("market.jumps.sigma", market.jumps.sigma)?;
        if market.jumps.sigma < 0.0 {
            return Err(ConfigError::invalid(
                "market.jumps.sigma",
                "must be non-negative",
            ));
        }
    }
    if market.vol_cluster.enabled {
        let lambda = market.vol_cluster.lambda;
        if !lambda.is_finite() || !(0.0..1.0).contains(&lambda) {
            return Err(ConfigError::invalid(
                "market.vol_cluster.lambda",
                "must be in [0, 1)",
            ));
        }
        finite("market.vol_cluster.shock", market.vol_cluster.shock)?;
        if market.vol_cluster.shock < 0.0 {
            return Err(ConfigError::invalid(
                "market.vol_cluster.shock",
                "must be non-negative",
            ));
        }
    }
    Ok(())
}

fn finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be finite"))
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be positive"))
    }
}

fn in_open_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be in (0, 1)"))
    }
}

fn in_closed_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be in [0, 1]"))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::config::{BarrierLevel, SessionMask, StepWindow};

    fn field_of(config: &Config) -> String {
        let Err(err) = validate_config(config) else {
            panic!("expected validation to fail");
        };
        match err.field() {
            Some(field) => field.to_string(),
            None => panic!("expected an invalid-field error, got {err}"),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(1.0 ; "one")]
    #[test_case(-0.1 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    fn test_period_limit_rejected(value: f64) {
        let config = Config {
            period_limit: value,
            ..Config::default()
        };
        assert_eq!(field_of(&config), "period_limit");
    }

    #[test]
    fn test_equal_freeze_thresholds_rejected() {
        let config = Config {
            freeze_in_pct: 0.05,
            freeze_out_pct: 0.05,
            ..Config::default()
        };
        assert_eq!(field_of(&config), "freeze_out_pct");
    }

    #[test]
    fn test_min_cap_above_base_rejected() {
        let config = Config {
            exposure_cap_base: 0.01,
            exposure_cap_min: 0.02,
            ..Config::default()
        };
        assert_eq!(field_of(&config), "exposure_cap_min");
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(1.5 ; "above one")]
    fn test_pacing_rate_rejected(value: f64) {
        let config = Config {
            pacing_rate: value,
            ..Config::default()
        };
        assert_eq!(field_of(&config), "pacing_rate");
    }

    #[test]
    fn test_zero_steps_per_period_rejected() {
        let config = Config {
            steps_per_period: 0,
            ..Config::default()
        };
        assert_eq!(field_of(&config), "steps_per_period");
    }

    #[test]
    fn test_barrier_multiplier_out_of_range_rejected() {
        let mut config = Config::default();
        config.soft_barrier.levels = vec![BarrierLevel::new(0.0, 1.2)];
        assert_eq!(field_of(&config), "soft_barrier.levels[0].multiplier");
    }

    #[test]
    fn test_empty_barrier_rejected() {
        let mut config = Config::default();
        config.soft_barrier.levels.clear();
        assert_eq!(field_of(&config), "soft_barrier.levels");
    }

    #[test]
    fn test_student_t_requires_nu_above_two() {
        let mut config = Config::default();
        config.market.sampler = SamplerKind::StudentT;
        config.market.nu = 2.0;
        assert_eq!(field_of(&config), "market.nu");
    }

    #[test_case(1.5, 3.0, "market.mixture.p_tail" ; "tail probability above one")]
    #[test_case(0.1, 0.0, "market.mixture.tail_mult" ; "zero tail multiplier")]
    #[test_case(0.1, f64::NAN, "market.mixture.tail_mult" ; "nan tail multiplier")]
    fn test_mixture_parameters_rejected(p_tail: f64, tail_mult: f64, field: &str) {
        let mut config = Config::default();
        config.market.sampler = SamplerKind::Mixture;
        config.market.mixture.p_tail = p_tail;
        config.market.mixture.tail_mult = tail_mult;
        assert_eq!(field_of(&config), field);
    }

    #[test]
    fn test_mixture_parameters_ignored_for_other_samplers() {
        let mut config = Config::default();
        config.market.mixture.p_tail = 1.5;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_inverted_blackout_window_rejected() {
        let mut config = Config::default();
        config.gating.blackout_windows = vec![StepWindow::new(5, 3)];
        assert_eq!(field_of(&config), "gating.blackout_windows[0]");
    }

    #[test]
    fn test_zero_session_period_rejected() {
        let mut config = Config::default();
        config.gating.session = Some(SessionMask {
            period_len: 0,
            allow: Vec::new(),
        });
        assert_eq!(field_of(&config), "gating.session.period_len");
    }

    #[test]
    fn test_smoothing_weight_rejected() {
        let config = Config {
            freeze_smoothing: Some(0.0),
            ..Config::default()
        };
        assert_eq!(field_of(&config), "freeze_smoothing");
    }

    #[test]
    fn test_confidence_rejected() {
        let mut config = Config::default();
        config.harness.confidence = 1.0;
        assert_eq!(field_of(&config), "harness.confidence");
    }
}
