//! Single-trial simulation.
//!
//! A trial starts at the configured equity, asks every enabled policy module
//! for a proposal each step, aggregates them, draws a raw return and updates
//! the state until the target is hit, the lifetime limit is breached or the
//! maximum length is reached.

mod driver;
mod error;
mod evaluator;
mod kpi;
mod result;
mod returns;
mod state;

pub use driver::run_trial;
pub(crate) use driver::simulate;
pub use error::TrialError;
pub use evaluator::{Evaluation, evaluate};
pub use kpi::{
    RunKpis, downside_risk_ratio, es95, growth_rate, max_drawdown, max_period_drawdown,
};
pub use result::{RunResult, TerminationReason, TrialSummary};
pub use returns::{
    PeriodState, ReturnGenerator, SampledReturns, ScriptedReturns, TrialRng, trial_rng,
};
pub use state::SimulationState;
