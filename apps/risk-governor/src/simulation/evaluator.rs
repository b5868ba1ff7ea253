//! Pass/fail evaluation of a finished trial.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::policy::BreachMonitor;

/// Outcome of each pass criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// The profit target was reached.
    pub target_hit: bool,
    /// No period or lifetime breach occurred.
    pub breach_free: bool,
    /// The target was reached within the allowed steps and periods.
    pub within_length: bool,
}

impl Evaluation {
    /// Whether every criterion holds.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.target_hit && self.breach_free && self.within_length
    }
}

/// Evaluate a trial from its breach record.
///
/// The length criterion is judged on the step at which the target was hit.
/// [`run_trial`](super::run_trial) stops at the length limit, so its trials
/// can only fail it when the record was built from a longer external path.
#[must_use]
pub fn evaluate(breaches: &BreachMonitor, config: &Config) -> Evaluation {
    let within_length = breaches.target_hit_step.is_some_and(|step| {
        step < config.max_trial_steps
            && step
                .checked_div(config.steps_per_period)
                .is_some_and(|period| period < config.max_periods)
    });

    Evaluation {
        target_hit: breaches.target_hit(),
        breach_free: !breaches.any_breach(),
        within_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Limits;

    fn hit_at(step: u64, config: &Config) -> BreachMonitor {
        let limits = Limits::from_config(config);
        let mut breaches = BreachMonitor::default();
        breaches.check(step, 1.2, 1.15, &limits);
        breaches
    }

    #[test]
    fn test_pass_requires_target_without_breach() {
        let config = Config::default();
        let limits = Limits::from_config(&config);
        let mut breaches = BreachMonitor::default();
        breaches.check(3, 1.11, 1.08, &limits);

        let eval = evaluate(&breaches, &config);
        assert!(eval.passed());
    }

    #[test]
    fn test_breach_fails_even_with_target() {
        let config = Config::default();
        let limits = Limits::from_config(&config);
        let mut breaches = BreachMonitor::default();
        breaches.check(0, 0.97, 1.0, &limits);
        breaches.start_period();
        breaches.check(9, 1.11, 1.0, &limits);

        let eval = evaluate(&breaches, &config);
        assert!(eval.target_hit);
        assert!(eval.within_length);
        assert!(!eval.breach_free);
        assert!(!eval.passed());
    }

    #[test]
    fn test_no_target_fails() {
        let config = Config::default();
        let eval = evaluate(&BreachMonitor::default(), &config);
        assert!(!eval.target_hit);
        assert!(!eval.within_length);
        assert!(!eval.passed());
    }

    #[test]
    fn test_target_after_last_period_fails() {
        let config = Config::default();
        let eval = evaluate(&hit_at(30, &config), &config);
        assert!(eval.target_hit);
        assert!(!eval.within_length);
        assert!(!eval.passed());
    }

    #[test]
    fn test_length_counts_periods_not_steps() {
        let config = Config {
            steps_per_period: 5,
            max_trial_steps: 40,
            ..Config::default()
        };
        assert!(evaluate(&hit_at(39, &config), &config).passed());

        let eval = evaluate(&hit_at(40, &config), &config);
        assert!(!eval.within_length);

        let config = Config {
            steps_per_period: 5,
            ..Config::default()
        };
        assert!(evaluate(&hit_at(149, &config), &config).passed());
        assert!(!evaluate(&hit_at(150, &config), &config).passed());
    }
}
