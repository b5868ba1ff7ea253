//! External gating rules.

use crate::config::GatingConfig;

/// Whether `step` falls inside any blackout window.
#[must_use]
pub fn is_blackout(gating: &GatingConfig, step: u64) -> bool {
    gating.blackout_windows.iter().any(|w| w.contains(step))
}

/// Whether `step` is inside an allowed session. No mask means always in session.
#[must_use]
pub fn in_session(gating: &GatingConfig, step: u64) -> bool {
    gating.session.as_ref().is_none_or(|mask| mask.allows(step))
}

/// Apply the configured risk cap; returns the cap when it binds.
#[must_use]
pub fn binding_cap(gating: &GatingConfig, risk: f64) -> Option<f64> {
    gating.risk_cap.filter(|cap| risk > *cap)
}
