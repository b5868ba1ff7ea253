//! Hysteresis freeze on the cushion above the protective floor.
//!
//! The protective floor is `HWM * (1 - alpha)`. The policy compares the
//! cushion fraction `(equity - floor) / HWM` against two thresholds:
//!
//! - `Active -> Frozen` when the cushion drops below `freeze_in`
//! - `Frozen -> Active` when the cushion rises above `freeze_out`
//! - otherwise the state is kept
//!
//! While frozen the proposal is exactly zero with the freeze flag set.

use serde::{Deserialize, Serialize};

use crate::config::Config;

use super::types::{PolicyContext, PolicyProposal, StepOutcome};

/// Freeze state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeState {
    /// Trading allowed.
    #[default]
    Active,
    /// No risk until the cushion recovers above the unfreeze threshold.
    Frozen,
}

/// Freeze policy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreezeParams {
    /// Freeze below this cushion fraction.
    pub freeze_in: f64,
    /// Unfreeze above this cushion fraction.
    pub freeze_out: f64,
    /// Multiplier on the cushion fraction.
    pub gain: f64,
    /// Upper bound of the proposal.
    pub ceiling: f64,
    /// EMA weight of the newest cushion observation.
    pub smoothing: Option<f64>,
}

impl FreezeParams {
    /// Extract the freeze parameters from a configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            freeze_in: config.freeze_in_pct,
            freeze_out: config.freeze_out_pct,
            gain: config.freeze_gain,
            ceiling: config.freeze_ceiling,
            smoothing: config.freeze_smoothing,
        }
    }
}

/// Next freeze state for a cushion fraction.
#[must_use]
pub fn transition(state: FreezeState, cushion: f64, params: &FreezeParams) -> FreezeState {
    match state {
        FreezeState::Active if cushion < params.freeze_in => FreezeState::Frozen,
        FreezeState::Frozen if cushion > params.freeze_out => FreezeState::Active,
        unchanged => unchanged,
    }
}

/// Hysteresis freeze policy.
#[derive(Debug, Clone)]
pub struct FreezePolicy {
    params: FreezeParams,
    state: FreezeState,
    smoothed: Option<f64>,
}

impl FreezePolicy {
    /// Create an active freeze policy.
    #[must_use]
    pub const fn new(params: FreezeParams) -> Self {
        Self {
            params,
            state: FreezeState::Active,
            smoothed: None,
        }
    }

    /// Current committed state.
    #[must_use]
    pub const fn state(&self) -> FreezeState {
        self.state
    }

    /// Propose a risk fraction for the step.
    #[must_use]
    pub fn propose(&self, ctx: &PolicyContext<'_>) -> PolicyProposal {
        let next = transition(self.state, ctx.cushion, &self.params);
        if next == FreezeState::Frozen {
            return PolicyProposal::frozen().with_note("cushion", ctx.cushion);
        }

        let cushion = ctx.cushion.max(0.0);
        let effective = match (self.params.smoothing, self.smoothed) {
            (Some(_), Some(smoothed)) => smoothed,
            _ => cushion,
        };
        let risk = (effective * self.params.gain).min(self.params.ceiling);

        PolicyProposal::new(risk)
            .with_note("cushion", ctx.cushion)
            .with_note("effective_cushion", effective)
    }

    /// Commit the state transition for the realized outcome.
    pub fn observe(&mut self, outcome: &StepOutcome) {
        self.state = transition(self.state, outcome.cushion_after, &self.params);

        if let Some(weight) = self.params.smoothing {
            let cushion = outcome.cushion_after.max(0.0);
            self.smoothed = Some(match self.smoothed {
                Some(prev) => weight.mul_add(cushion, (1.0 - weight) * prev),
                None => cushion,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatingConfig;
    use crate::policy::types::Limits;

    fn params() -> FreezeParams {
        FreezeParams::from_config(&Config::default())
    }

    fn outcome_with_cushion(cushion: f64) -> StepOutcome {
        StepOutcome {
            step: 0,
            applied_risk: 0.0,
            market_return: 0.0,
            pnl: 0.0,
            equity_before: 1.0,
            equity_after: 1.0,
            hwm_after: 1.0,
            cushion_after: cushion,
            period_rollover: false,
        }
    }

    /// Equity that yields `cushion` at HWM 1 with alpha 0.10.
    fn equity_for(cushion: f64) -> f64 {
        0.9 + cushion
    }

    #[test]
    fn test_transition_is_sticky_between_thresholds() {
        let p = params();
        assert_eq!(transition(FreezeState::Active, 0.06, &p), FreezeState::Active);
        assert_eq!(transition(FreezeState::Frozen, 0.06, &p), FreezeState::Frozen);
        assert_eq!(transition(FreezeState::Active, 0.04, &p), FreezeState::Frozen);
        assert_eq!(transition(FreezeState::Frozen, 0.09, &p), FreezeState::Active);
    }

    #[test]
    fn test_frozen_below_freeze_in_until_above_freeze_out() {
        let gating = GatingConfig::default();
        let mut policy = FreezePolicy::new(params());

        let ctx = PolicyContext::new(0, equity_for(0.03), 1.0, Limits::default(), &gating);
        let proposal = policy.propose(&ctx);
        assert!(proposal.freeze);
        assert_eq!(proposal.risk, 0.0);
        policy.observe(&outcome_with_cushion(0.03));
        assert_eq!(policy.state(), FreezeState::Frozen);

        for cushion in [0.06, 0.07, 0.075] {
            let ctx = PolicyContext::new(1, equity_for(cushion), 1.0, Limits::default(), &gating);
            assert!(policy.propose(&ctx).freeze, "still frozen at {cushion}");
            policy.observe(&outcome_with_cushion(cushion));
        }

        let ctx = PolicyContext::new(2, equity_for(0.081), 1.0, Limits::default(), &gating);
        let proposal = policy.propose(&ctx);
        assert!(!proposal.freeze);
        assert!(proposal.risk > 0.0);
    }

    #[test]
    fn test_propose_has_no_side_effects() {
        let gating = GatingConfig::default();
        let policy = FreezePolicy::new(params());
        let ctx = PolicyContext::new(0, equity_for(0.01), 1.0, Limits::default(), &gating);

        let _ = policy.propose(&ctx);
        assert_eq!(policy.state(), FreezeState::Active);
    }

    #[test]
    fn test_active_proposal_capped_at_ceiling() {
        let gating = GatingConfig::default();
        let policy = FreezePolicy::new(params());
        let ctx = PolicyContext::new(0, 1.0, 1.0, Limits::default(), &gating);

        // cushion 0.10 * gain 1.0 exceeds the 0.02 ceiling
        let proposal = policy.propose(&ctx);
        assert!((proposal.risk - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_blends_observations() {
        let mut p = params();
        p.smoothing = Some(0.5);
        p.ceiling = 1.0;
        let mut policy = FreezePolicy::new(p);

        policy.observe(&outcome_with_cushion(0.10));
        policy.observe(&outcome_with_cushion(0.06));

        let gating = GatingConfig::default();
        let ctx = PolicyContext::new(2, equity_for(0.06), 1.0, Limits::default(), &gating);
        let proposal = policy.propose(&ctx);
        assert!((proposal.risk - 0.08).abs() < 1e-12);
    }
}
