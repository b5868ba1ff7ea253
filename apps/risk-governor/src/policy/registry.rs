//! Module registry: configuration to instantiated modules.

use crate::config::Config;

use super::types::PolicyKind;
use super::{BudgetGate, BudgetParams, FreezeParams, FreezePolicy, PolicyModule, SoftBarrier, VolTarget};

/// Instantiate every enabled module in canonical order.
#[must_use]
pub fn build_modules(config: &Config) -> Vec<PolicyModule> {
    let flags = &config.modules;
    PolicyKind::ALL
        .into_iter()
        .filter_map(|kind| match kind {
            PolicyKind::Freeze if flags.freeze => Some(PolicyModule::Freeze(FreezePolicy::new(
                FreezeParams::from_config(config),
            ))),
            PolicyKind::BudgetGate if flags.budget_gate => Some(PolicyModule::BudgetGate(
                BudgetGate::new(BudgetParams::from_config(config)),
            )),
            PolicyKind::SoftBarrier if flags.soft_barrier => {
                Some(PolicyModule::SoftBarrier(SoftBarrier::new(&config.soft_barrier)))
            }
            PolicyKind::VolTarget if flags.vol_target => {
                Some(PolicyModule::VolTarget(VolTarget::new(&config.vol_target)))
            }
            _ => None,
        })
        .collect()
}
