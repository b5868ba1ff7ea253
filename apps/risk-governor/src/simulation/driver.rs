//! Simulation driver: advances one trial through time.
//!
//! Per step:
//!
//! 1. build the context from the current state
//! 2. every enabled module proposes
//! 3. aggregate and record the decision
//! 4. draw the next raw return
//! 5. `pnl = equity * risk * return`, equity floored at a small epsilon
//! 6. update HWM, volatility estimate and breach flags
//! 7. every module observes the outcome
//! 8. advance the period counter
//!
//! The trial stops on the first of: target hit, lifetime breach, maximum
//! length.

use tracing::{debug, warn};

use crate::config::{Config, ewma_lambda};
use crate::engine::{StepRecord, TelemetrySink, aggregate};
use crate::error::GovernorError;
use crate::numeric::{EQUITY_FLOOR, safe_div};
use crate::policy::{Limits, PolicyKind, PolicyProposal, RiskPolicy, StepOutcome, build_modules};

use super::error::TrialError;
use super::evaluator::evaluate;
use super::kpi::RunKpis;
use super::result::{RunResult, TerminationReason};
use super::returns::{PeriodState, ReturnGenerator, trial_rng};
use super::state::SimulationState;

/// Run one trial to termination.
///
/// The configuration is validated before the first step.
///
/// # Errors
///
/// Returns [`GovernorError::Config`] naming the rejected field, or
/// [`GovernorError::Trial`] if the generator yields a non-finite return or
/// equity becomes non-finite.
pub fn run_trial<G, S>(
    config: &Config,
    generator: &mut G,
    seed: u64,
    sink: &mut S,
) -> Result<RunResult, GovernorError>
where
    G: ReturnGenerator,
    S: TelemetrySink + ?Sized,
{
    config.validate()?;
    Ok(simulate(config, generator, seed, sink)?)
}

/// Trial loop over an already validated configuration.
pub(crate) fn simulate<G, S>(
    config: &Config,
    generator: &mut G,
    seed: u64,
    sink: &mut S,
) -> Result<RunResult, TrialError>
where
    G: ReturnGenerator,
    S: TelemetrySink + ?Sized,
{
    let limits = Limits::from_config(config);
    let vol_lambda = ewma_lambda(config.vol_halflife);
    let mut modules = build_modules(config);
    let mut state = SimulationState::new(config.initial_equity, config.period_limit);
    let mut rng = trial_rng(seed);

    let capacity = usize::try_from(config.max_trial_steps.min(4096)).unwrap_or(0);
    let mut equity_path = Vec::with_capacity(capacity + 1);
    let mut risk_path = Vec::with_capacity(capacity);
    let mut step_returns = Vec::with_capacity(capacity);
    let mut proposals: Vec<(PolicyKind, PolicyProposal)> = Vec::with_capacity(modules.len());
    equity_path.push(state.equity);

    let termination = loop {
        let ctx = state.context(limits, config.requested_risk, &config.gating);
        proposals.clear();
        proposals.extend(modules.iter().map(|m| (m.kind(), m.propose(&ctx))));
        let decision = aggregate(&ctx, &proposals);
        sink.record(&StepRecord::new(state.step, &proposals, &decision));

        let period = PeriodState {
            step: state.step,
            period: state.period,
            step_in_period: state.step_in_period,
        };
        let raw = generator.next_return(&period, &mut rng);
        if !raw.is_finite() {
            warn!(seed, step = state.step, value = raw, "Non-finite return");
            return Err(TrialError::NonFiniteReturn {
                step: state.step,
                value: raw,
            });
        }

        let risk = decision.final_risk;
        let equity_before = state.equity;
        let equity_after = risk
            .mul_add(equity_before * raw, equity_before)
            .max(EQUITY_FLOOR);
        if !equity_after.is_finite() {
            warn!(seed, step = state.step, "Non-finite equity");
            return Err(TrialError::NonFiniteEquity { step: state.step });
        }

        state.equity = equity_after;
        state.hwm = state.hwm.max(equity_after);
        let portfolio_return = safe_div(equity_after - equity_before, equity_before);
        state.update_vol(portfolio_return, vol_lambda);
        state
            .breaches
            .check(state.step, equity_after, state.period_start_equity, &limits);

        let rollover = state.step_in_period + 1 >= config.steps_per_period;
        let floor = state.hwm * (1.0 - limits.freeze_alpha);
        let outcome = StepOutcome {
            step: state.step,
            applied_risk: risk,
            market_return: raw,
            pnl: equity_after - equity_before,
            equity_before,
            equity_after,
            hwm_after: state.hwm,
            cushion_after: safe_div(equity_after - floor, state.hwm),
            period_rollover: rollover,
        };
        for module in &mut modules {
            module.observe(&outcome);
        }

        state.spend_budget(risk * equity_before);
        if let Some(gate) = modules.iter().find_map(|m| m.as_budget_gate()) {
            state.remaining_budget = gate.remaining_budget();
        }

        state.step += 1;
        state.last_pnl = outcome.pnl;
        state.last_risk = risk;
        if rollover {
            state.roll_period(config.period_limit);
            if let Some(gate) = modules.iter().find_map(|m| m.as_budget_gate()) {
                state.remaining_budget = gate.remaining_budget();
            }
        } else {
            state.step_in_period += 1;
        }

        equity_path.push(equity_after);
        risk_path.push(risk);
        step_returns.push(portfolio_return);

        if state.breaches.target_hit() {
            break TerminationReason::TargetHit;
        }
        if state.breaches.lifetime_breached() {
            break TerminationReason::LifetimeBreach;
        }
        if state.period >= config.max_periods || state.step >= config.max_trial_steps {
            break TerminationReason::MaxLength;
        }
    };

    let periods = state.periods_touched();
    let evaluation = evaluate(&state.breaches, config);
    let budget_resets = modules
        .iter()
        .find_map(|m| m.as_budget_gate())
        .map_or(0, |gate| gate.resets());

    debug!(
        seed,
        termination = %termination,
        steps = state.step,
        final_equity = state.equity,
        passed = evaluation.passed(),
        "Trial finished"
    );

    Ok(RunResult {
        seed,
        kpis: RunKpis::compute(&equity_path, &step_returns, periods, config.steps_per_period),
        equity_path,
        risk_path,
        period_breaches: state.breaches.period_breaches,
        lifetime_breaches: state.breaches.lifetime_breaches,
        target_hit_step: state.breaches.target_hit_step,
        periods_to_target: state
            .breaches
            .target_hit_step
            .and_then(|step| step.checked_div(config.steps_per_period))
            .map(|period| period + 1),
        termination,
        steps: state.step,
        periods,
        budget_resets,
        passed: evaluation.passed(),
    })
}
