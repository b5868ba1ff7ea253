//! Property tests for the governor's universal invariants.

use proptest::prelude::{any, prop, prop_assert, prop_assert_eq, proptest};

use risk_governor::config::{Config, GatingConfig};
use risk_governor::engine::{NullSink, aggregate};
use risk_governor::monte_carlo::wilson_interval;
use risk_governor::policy::{
    BudgetGate, BudgetParams, BudgetState, FreezeParams, FreezeState, Limits, PolicyContext,
    PolicyKind, PolicyProposal, StepOutcome, transition,
};
use risk_governor::simulation::{ScriptedReturns, run_trial};

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn prop_aggregate_never_exceeds_smallest_proposal(
        raw in prop::collection::vec((0usize..4, -0.5f64..1.5, any::<bool>()), 0..6),
        last_pnl in -0.05f64..0.05,
        previous_risk in 0.0f64..1.0,
        risk_cap in prop::option::of(0.0f64..1.0),
        step in 0u64..100,
    ) {
        let gating = GatingConfig { risk_cap, ..GatingConfig::default() };
        let ctx = PolicyContext::new(step, 1.0, 1.0, Limits::default(), &gating)
            .with_history(last_pnl, previous_risk);
        let proposals: Vec<(PolicyKind, PolicyProposal)> = raw
            .iter()
            .map(|(kind, risk, freeze)| {
                let proposal = if *freeze { PolicyProposal::frozen() } else { PolicyProposal::new(*risk) };
                (PolicyKind::ALL[*kind], proposal)
            })
            .collect();

        let result = aggregate(&ctx, &proposals);
        let smallest = proposals.iter().map(|(_, p)| p.risk).fold(f64::INFINITY, f64::min);

        prop_assert!((0.0..=1.0).contains(&result.final_risk));
        if proposals.is_empty() {
            prop_assert_eq!(result.final_risk, 0.0);
        } else {
            prop_assert!(result.final_risk <= smallest);
        }
        if last_pnl < 0.0 {
            prop_assert!(result.final_risk <= previous_risk);
        }
        if let Some(cap) = risk_cap {
            prop_assert!(result.final_risk <= cap);
        }
    }

    #[test]
    fn prop_no_upsize_after_losing_step(
        returns in prop::collection::vec(-3.0f64..3.0, 1..60),
    ) {
        let config = Config::default();
        let mut generator = ScriptedReturns::new(returns);
        let Ok(result) = run_trial(&config, &mut generator, 0, &mut NullSink) else {
            panic!("finite returns never fail a trial");
        };

        for (equity, risk) in result.equity_path.windows(2).zip(result.risk_path.windows(2)) {
            if equity[1] < equity[0] {
                prop_assert!(risk[1] <= risk[0]);
            }
        }
    }

    #[test]
    fn prop_freeze_is_sticky_between_thresholds(
        freeze_in in 0.0f64..0.2,
        band in 0.001f64..0.2,
        position in 0.01f64..0.99,
    ) {
        let params = FreezeParams {
            freeze_in,
            freeze_out: freeze_in + band,
            gain: 1.0,
            ceiling: 0.02,
            smoothing: None,
        };
        let cushion = band.mul_add(position, freeze_in);

        prop_assert_eq!(transition(FreezeState::Active, cushion, &params), FreezeState::Active);
        prop_assert_eq!(transition(FreezeState::Frozen, cushion, &params), FreezeState::Frozen);
    }

    #[test]
    fn prop_budget_never_negative(
        steps in prop::collection::vec((0.0f64..1.0, -2.0f64..2.0, any::<bool>()), 1..80),
    ) {
        let config = Config::default();
        let mut gate = BudgetGate::new(BudgetParams::from_config(&config));
        let mut equity = config.initial_equity;
        let mut rollovers = 0;

        for (risk, ret, rollover) in steps {
            let equity_after = risk.mul_add(equity * ret, equity).max(1e-12);
            gate.observe(&StepOutcome {
                step: 0,
                applied_risk: risk,
                market_return: ret,
                pnl: equity_after - equity,
                equity_before: equity,
                equity_after,
                hwm_after: equity_after,
                cushion_after: 0.0,
                period_rollover: rollover,
            });
            equity = equity_after;
            if rollover && gate.state() != BudgetState::LifetimeBreached {
                rollovers += 1;
            }

            prop_assert!(gate.remaining_budget() >= 0.0);
            prop_assert_eq!(gate.resets(), rollovers);
        }
    }

    #[test]
    fn prop_budget_resets_once_per_period(
        steps_per_period in 1u64..6,
        max_periods in 1u64..10,
    ) {
        let config = Config { steps_per_period, max_periods, ..Config::default() };
        let mut generator = ScriptedReturns::constant(0.0);
        let Ok(result) = run_trial(&config, &mut generator, 0, &mut NullSink) else {
            panic!("flat returns never fail a trial");
        };

        prop_assert_eq!(result.periods, max_periods);
        prop_assert_eq!(result.budget_resets, result.periods);
        prop_assert_eq!(result.steps, steps_per_period * max_periods);
    }

    #[test]
    fn prop_wilson_bounds_bracket_pass_rate(
        n in 1u64..5000,
        successes in 0.0f64..=1.0,
        confidence in 0.5f64..0.999,
    ) {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let k = ((n as f64) * successes).floor() as u64;
        let (lower, upper) = wilson_interval(k, n, confidence);
        #[allow(clippy::cast_precision_loss)]
        let p = k as f64 / n as f64;

        prop_assert!(0.0 <= lower);
        prop_assert!(lower <= p);
        prop_assert!(p <= upper);
        prop_assert!(upper <= 1.0);
    }
}
