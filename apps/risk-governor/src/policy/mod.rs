//! Policy modules.
//!
//! Every module is a pure function of a [`PolicyContext`] to a bounded
//! [`PolicyProposal`]. Internal state changes only through
//! [`RiskPolicy::observe`], called once per step after the P&L is known.
//!
//! The set of module kinds is closed ([`PolicyKind`]); [`PolicyModule`]
//! holds one implementation per kind and [`build_modules`] is the single
//! registry that instantiates them from configuration.

mod breach;
mod budget_gate;
mod freeze;
mod registry;
mod soft_barrier;
mod types;
mod vol_target;

pub use breach::{BreachCheck, BreachMonitor};
pub use budget_gate::{BudgetGate, BudgetParams, BudgetState};
pub use freeze::{FreezeParams, FreezePolicy, FreezeState, transition};
pub use registry::build_modules;
pub use soft_barrier::SoftBarrier;
pub use types::{Limits, PolicyContext, PolicyKind, PolicyProposal, StepOutcome};
pub use vol_target::VolTarget;

/// Contract shared by every policy module.
pub trait RiskPolicy {
    /// Kind of this module.
    fn kind(&self) -> PolicyKind;

    /// Propose a risk fraction in `[0, 1]` for the step. Must not change state.
    fn propose(&self, ctx: &PolicyContext<'_>) -> PolicyProposal;

    /// Update internal state from the realized step.
    fn observe(&mut self, outcome: &StepOutcome);
}

/// One registered policy module.
#[derive(Debug, Clone)]
pub enum PolicyModule {
    /// Hysteresis freeze.
    Freeze(FreezePolicy),
    /// Loss budgets.
    BudgetGate(BudgetGate),
    /// Soft barrier.
    SoftBarrier(SoftBarrier),
    /// Volatility target.
    VolTarget(VolTarget),
}

impl PolicyModule {
    /// The budget gate, if this module is one.
    #[must_use]
    pub const fn as_budget_gate(&self) -> Option<&BudgetGate> {
        match self {
            Self::BudgetGate(gate) => Some(gate),
            _ => None,
        }
    }
}

impl RiskPolicy for PolicyModule {
    fn kind(&self) -> PolicyKind {
        match self {
            Self::Freeze(_) => PolicyKind::Freeze,
            Self::BudgetGate(_) => PolicyKind::BudgetGate,
            Self::SoftBarrier(_) => PolicyKind::SoftBarrier,
            Self::VolTarget(_) => PolicyKind::VolTarget,
        }
    }

    fn propose(&self, ctx: &PolicyContext<'_>) -> PolicyProposal {
        match self {
            Self::Freeze(p) => p.propose(ctx),
            Self::BudgetGate(p) => p.propose(ctx),
            Self::SoftBarrier(p) => p.propose(ctx),
            Self::VolTarget(p) => p.propose(ctx),
        }
    }

    fn observe(&mut self, outcome: &StepOutcome) {
        match self {
            Self::Freeze(p) => p.observe(outcome),
            Self::BudgetGate(p) => p.observe(outcome),
            Self::SoftBarrier(_) => {}
            Self::VolTarget(p) => p.observe(outcome),
        }
    }
}
