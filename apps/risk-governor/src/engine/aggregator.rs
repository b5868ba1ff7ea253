//! Aggregation and invariant enforcement.
//!
//! Proposals are combined in a fixed order:
//!
//! 1. collect proposals and freeze flags
//! 2. take the minimum (0 when no module is enabled)
//! 3. any freeze flag forces 0
//! 4. after a losing step, never exceed the previously applied risk
//! 5. apply the external risk cap (only reduces)
//! 6. blackout windows and out-of-session steps force 0
//! 7. clamp to `[0, 1]`
//!
//! No invariant can raise the value, so the result never exceeds the
//! smallest proposal.

use serde::Serialize;

use crate::numeric::{BINDING_TOLERANCE, clamp_unit};
use crate::policy::{PolicyContext, PolicyKind, PolicyProposal};

use super::gating::{binding_cap, in_session, is_blackout};

/// An invariant that changed the aggregated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjustment {
    /// A module requested a freeze.
    FreezeOverride,
    /// The value was clamped to the previous step's risk after a loss.
    NoUpsizeAfterLoss {
        /// Risk applied on the previous step.
        previous: f64,
        /// Value before the clamp.
        proposed: f64,
    },
    /// The external risk cap bound.
    GatingCap {
        /// Configured cap.
        cap: f64,
    },
    /// The step lies in a blackout window.
    Blackout,
    /// The step lies outside every allowed session.
    OutOfSession,
}

/// Aggregated decision for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    /// Final risk fraction in `[0, 1]`.
    pub final_risk: f64,
    /// Minimum of the proposals before invariants.
    pub raw_min: f64,
    /// Modules that determined the raw minimum (or requested the freeze).
    pub binding: Vec<PolicyKind>,
    /// Whether a freeze was in force.
    pub freeze_active: bool,
    /// Invariants that changed the value, in application order.
    pub adjustments: Vec<Adjustment>,
}

/// Combine module proposals into the final risk for the step.
#[must_use]
pub fn aggregate(ctx: &PolicyContext<'_>, proposals: &[(PolicyKind, PolicyProposal)]) -> AggregationResult {
    let mut adjustments = Vec::new();

    let freeze_active = proposals.iter().any(|(_, p)| p.freeze);
    let raw_min = proposals
        .iter()
        .map(|(_, p)| clamp_unit(p.risk))
        .reduce(f64::min)
        .unwrap_or(0.0);

    let binding: Vec<PolicyKind> = if freeze_active {
        proposals
            .iter()
            .filter(|(_, p)| p.freeze)
            .map(|(kind, _)| *kind)
            .collect()
    } else {
        proposals
            .iter()
            .filter(|(_, p)| clamp_unit(p.risk) - raw_min <= BINDING_TOLERANCE)
            .map(|(kind, _)| *kind)
            .collect()
    };

    let mut risk = raw_min;

    if freeze_active {
        risk = 0.0;
        adjustments.push(Adjustment::FreezeOverride);
    }

    if ctx.after_loss() && risk > ctx.previous_risk {
        adjustments.push(Adjustment::NoUpsizeAfterLoss {
            previous: ctx.previous_risk,
            proposed: risk,
        });
        risk = clamp_unit(ctx.previous_risk);
    }

    if let Some(cap) = binding_cap(ctx.gating, risk) {
        adjustments.push(Adjustment::GatingCap { cap });
        risk = cap;
    }

    if is_blackout(ctx.gating, ctx.step) {
        if risk > 0.0 {
            adjustments.push(Adjustment::Blackout);
        }
        risk = 0.0;
    }
    if !in_session(ctx.gating, ctx.step) {
        if risk > 0.0 {
            adjustments.push(Adjustment::OutOfSession);
        }
        risk = 0.0;
    }

    AggregationResult {
        final_risk: clamp_unit(risk),
        raw_min,
        binding,
        freeze_active,
        adjustments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatingConfig, SessionMask, StepWindow};
    use crate::policy::Limits;

    fn ctx(gating: &GatingConfig) -> PolicyContext<'_> {
        PolicyContext::new(0, 1.0, 1.0, Limits::default(), gating)
    }

    fn proposals(risks: &[(PolicyKind, f64)]) -> Vec<(PolicyKind, PolicyProposal)> {
        risks.iter().map(|(k, r)| (*k, PolicyProposal::new(*r))).collect()
    }

    #[test]
    fn test_all_equal_proposals_pass_through() {
        let gating = GatingConfig::default();
        let props = proposals(&[
            (PolicyKind::Freeze, 0.01),
            (PolicyKind::BudgetGate, 0.01),
            (PolicyKind::SoftBarrier, 0.01),
        ]);
        let result = aggregate(&ctx(&gating), &props);

        assert!((result.final_risk - 0.01).abs() < 1e-15);
        assert_eq!(result.binding.len(), 3);
        assert!(!result.freeze_active);
        assert!(result.adjustments.is_empty());
    }

    #[test]
    fn test_minimum_wins_and_is_binding() {
        let gating = GatingConfig::default();
        let props = proposals(&[
            (PolicyKind::Freeze, 0.02),
            (PolicyKind::BudgetGate, 0.0066),
            (PolicyKind::SoftBarrier, 0.01),
        ]);
        let result = aggregate(&ctx(&gating), &props);

        assert!((result.final_risk - 0.0066).abs() < 1e-15);
        assert_eq!(result.binding, vec![PolicyKind::BudgetGate]);
    }

    #[test]
    fn test_empty_proposals_give_zero() {
        let gating = GatingConfig::default();
        let result = aggregate(&ctx(&gating), &[]);
        assert_eq!(result.final_risk, 0.0);
        assert!(result.binding.is_empty());
    }

    #[test]
    fn test_freeze_forces_zero() {
        let gating = GatingConfig::default();
        let mut props = proposals(&[(PolicyKind::BudgetGate, 0.01)]);
        props.push((PolicyKind::Freeze, PolicyProposal::frozen()));

        let result = aggregate(&ctx(&gating), &props);
        assert_eq!(result.final_risk, 0.0);
        assert!(result.freeze_active);
        assert_eq!(result.binding, vec![PolicyKind::Freeze]);
        assert_eq!(result.adjustments, vec![Adjustment::FreezeOverride]);
    }

    #[test]
    fn test_no_upsize_after_loss() {
        let gating = GatingConfig::default();
        let context = ctx(&gating).with_history(-0.002, 0.01);
        let props = proposals(&[(PolicyKind::BudgetGate, 0.02)]);

        let result = aggregate(&context, &props);
        assert!((result.final_risk - 0.01).abs() < 1e-15);
        assert!(matches!(
            result.adjustments.as_slice(),
            [Adjustment::NoUpsizeAfterLoss { .. }]
        ));
    }

    #[test]
    fn test_downsize_after_loss_allowed() {
        let gating = GatingConfig::default();
        let context = ctx(&gating).with_history(-0.002, 0.01);
        let props = proposals(&[(PolicyKind::BudgetGate, 0.005)]);

        let result = aggregate(&context, &props);
        assert!((result.final_risk - 0.005).abs() < 1e-15);
    }

    #[test]
    fn test_gating_cap_only_reduces() {
        let gating = GatingConfig {
            risk_cap: Some(0.004),
            ..GatingConfig::default()
        };
        let high = aggregate(&ctx(&gating), &proposals(&[(PolicyKind::SoftBarrier, 0.01)]));
        assert!((high.final_risk - 0.004).abs() < 1e-15);

        let low = aggregate(&ctx(&gating), &proposals(&[(PolicyKind::SoftBarrier, 0.002)]));
        assert!((low.final_risk - 0.002).abs() < 1e-15);
    }

    #[test]
    fn test_blackout_forces_zero() {
        let gating = GatingConfig {
            blackout_windows: vec![StepWindow::new(0, 1)],
            ..GatingConfig::default()
        };
        let result = aggregate(&ctx(&gating), &proposals(&[(PolicyKind::SoftBarrier, 0.01)]));
        assert_eq!(result.final_risk, 0.0);
        assert_eq!(result.adjustments, vec![Adjustment::Blackout]);
    }

    #[test]
    fn test_out_of_session_forces_zero() {
        let gating = GatingConfig {
            session: Some(SessionMask {
                period_len: 10,
                allow: vec![StepWindow::new(5, 10)],
            }),
            ..GatingConfig::default()
        };
        let result = aggregate(&ctx(&gating), &proposals(&[(PolicyKind::SoftBarrier, 0.01)]));
        assert_eq!(result.final_risk, 0.0);
        assert_eq!(result.adjustments, vec![Adjustment::OutOfSession]);
    }
}
