//! External gating rules: risk cap, blackout windows and session masks.

use serde::{Deserialize, Serialize};

/// Half-open step range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepWindow {
    /// First step inside the window.
    pub start: u64,
    /// First step after the window.
    pub end: u64,
}

impl StepWindow {
    /// Create a window.
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Whether `step` lies inside the window.
    #[must_use]
    pub const fn contains(&self, step: u64) -> bool {
        self.start <= step && step < self.end
    }
}

/// Repeating session mask evaluated on `step % period_len`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMask {
    /// Length of the repeating cycle in steps.
    pub period_len: u64,
    /// Allowed intra-cycle windows.
    #[serde(default)]
    pub allow: Vec<StepWindow>,
}

impl SessionMask {
    /// Whether `step` falls inside an allowed window of the cycle.
    #[must_use]
    pub fn allows(&self, step: u64) -> bool {
        if self.period_len == 0 {
            return false;
        }
        let phase = step % self.period_len;
        self.allow.iter().any(|w| w.contains(phase))
    }
}

/// Gating configuration applied by the aggregator after the policy minimum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatingConfig {
    /// Hard cap on the final risk fraction; can only reduce.
    #[serde(default)]
    pub risk_cap: Option<f64>,
    /// Steps during which no risk is allowed.
    #[serde(default)]
    pub blackout_windows: Vec<StepWindow>,
    /// Allowed trading sessions; `None` means always in session.
    #[serde(default)]
    pub session: Option<SessionMask>,
}
