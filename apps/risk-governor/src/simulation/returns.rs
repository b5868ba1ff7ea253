//! Return generators.
//!
//! A generator maps the current period position and the trial's RNG to the
//! next raw return. It consumes randomness only through the RNG it is
//! handed, so a trial is fully determined by its seed. Generators that carry
//! a per-trial process (volatility clustering) are cloned fresh for every
//! trial.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal, StudentT};

use crate::config::{ConfigError, MixtureConfig, ReturnModelConfig, SamplerKind};

/// RNG handle threaded through every randomness consumer of a trial.
pub type TrialRng = StdRng;

/// Seeded RNG for one trial.
#[must_use]
pub fn trial_rng(seed: u64) -> TrialRng {
    StdRng::seed_from_u64(seed)
}

/// Position of the current step within the trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodState {
    /// Global step index.
    pub step: u64,
    /// Period index.
    pub period: u64,
    /// Step index within the period.
    pub step_in_period: u64,
}

/// Source of per-step raw returns.
pub trait ReturnGenerator: Clone + Send + Sync {
    /// Next raw return.
    fn next_return(&mut self, period: &PeriodState, rng: &mut TrialRng) -> f64;
}

/// Per-step shock distribution, resolved once from the configuration.
#[derive(Debug, Clone)]
enum Shock {
    Normal,
    StudentT { dist: StudentT<f64>, scale: f64 },
    Mixture { p_tail: f64, tail_mult: f64 },
}

/// Parametric sampler: Gaussian, variance-matched Student-t or scale-mixture
/// shocks, an optional jump overlay and optional EWMA volatility clustering.
#[derive(Debug, Clone)]
pub struct SampledReturns {
    config: ReturnModelConfig,
    shock: Shock,
    sigma: f64,
}

impl SampledReturns {
    /// Build the sampler from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] if the Student-t degrees of
    /// freedom or the mixture parameters are not usable.
    pub fn new(config: &ReturnModelConfig) -> Result<Self, ConfigError> {
        let shock = match config.sampler {
            SamplerKind::Gaussian => Shock::Normal,
            SamplerKind::StudentT => {
                if !(config.nu.is_finite() && config.nu > 2.0) {
                    return Err(ConfigError::invalid(
                        "market.nu",
                        "must be greater than 2 for the student_t sampler",
                    ));
                }
                let dist = StudentT::new(config.nu)
                    .map_err(|e| ConfigError::invalid("market.nu", e.to_string()))?;
                Shock::StudentT {
                    dist,
                    scale: (config.nu / (config.nu - 2.0)).sqrt(),
                }
            }
            SamplerKind::Mixture => {
                let MixtureConfig { p_tail, tail_mult } = config.mixture;
                if !(0.0..=1.0).contains(&p_tail) {
                    return Err(ConfigError::invalid("market.mixture.p_tail", "must be in [0, 1]"));
                }
                if !(tail_mult.is_finite() && tail_mult > 0.0) {
                    return Err(ConfigError::invalid(
                        "market.mixture.tail_mult",
                        "must be positive",
                    ));
                }
                Shock::Mixture { p_tail, tail_mult }
            }
        };

        Ok(Self {
            config: *config,
            shock,
            sigma: config.sigma,
        })
    }

    /// Volatility used for the next draw.
    #[must_use]
    pub const fn current_sigma(&self) -> f64 {
        self.sigma
    }

    fn shock(&self, rng: &mut TrialRng) -> f64 {
        match &self.shock {
            Shock::Normal => rng.sample(StandardNormal),
            Shock::StudentT { dist, scale } => dist.sample(rng) / scale,
            Shock::Mixture { p_tail, tail_mult } => {
                let z: f64 = rng.sample(StandardNormal);
                if rng.random::<f64>() < *p_tail {
                    z * tail_mult
                } else {
                    z
                }
            }
        }
    }
}

impl ReturnGenerator for SampledReturns {
    fn next_return(&mut self, _period: &PeriodState, rng: &mut TrialRng) -> f64 {
        let mut r = self.sigma.mul_add(self.shock(rng), self.config.mu);

        let jumps = self.config.jumps;
        if jumps.enabled && rng.random::<f64>() < jumps.probability {
            let z: f64 = rng.sample(StandardNormal);
            r += jumps.sigma * z;
        }

        let cluster = self.config.vol_cluster;
        if cluster.enabled {
            let eps: f64 = rng.sample(StandardNormal);
            let innovation = cluster.shock * eps.abs();
            self.sigma = cluster
                .lambda
                .mul_add(self.sigma * self.sigma, (1.0 - cluster.lambda) * innovation * innovation)
                .sqrt();
        }

        r
    }
}

/// Replays a fixed sequence of returns, repeating the last value once exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedReturns {
    values: Vec<f64>,
}

impl ScriptedReturns {
    /// Create a scripted generator; an empty script yields 0.
    #[must_use]
    pub const fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Constant return on every step.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl ReturnGenerator for ScriptedReturns {
    fn next_return(&mut self, period: &PeriodState, _rng: &mut TrialRng) -> f64 {
        let idx = usize::try_from(period.step).unwrap_or(usize::MAX);
        self.values
            .get(idx)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(0.0)
    }
}
