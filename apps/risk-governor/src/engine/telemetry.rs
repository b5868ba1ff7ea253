//! Per-step telemetry records and sinks.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::policy::{PolicyKind, PolicyProposal};

use super::aggregator::{Adjustment, AggregationResult};

/// One step's aggregation decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// Step index.
    pub step: u64,
    /// Proposed risk by module.
    pub proposals: BTreeMap<PolicyKind, f64>,
    /// Modules that determined the result.
    pub binding: Vec<PolicyKind>,
    /// Whether a freeze was in force.
    pub freeze_active: bool,
    /// Final risk fraction.
    pub final_risk: f64,
    /// Invariants that changed the value.
    pub adjustments: Vec<Adjustment>,
}

impl StepRecord {
    /// Build a record from the proposals and their aggregation.
    #[must_use]
    pub fn new(
        step: u64,
        proposals: &[(PolicyKind, PolicyProposal)],
        result: &AggregationResult,
    ) -> Self {
        Self {
            step,
            proposals: proposals.iter().map(|(k, p)| (*k, p.risk)).collect(),
            binding: result.binding.clone(),
            freeze_active: result.freeze_active,
            final_risk: result.final_risk,
            adjustments: result.adjustments.clone(),
        }
    }
}

/// Receiver of per-step records.
pub trait TelemetrySink {
    /// Consume one record.
    fn record(&mut self, record: &StepRecord);
}

/// Sink that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&mut self, _record: &StepRecord) {}
}

/// Sink that keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<StepRecord>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Records collected so far.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Take ownership of the collected records.
    #[must_use]
    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }
}

impl TelemetrySink for MemorySink {
    fn record(&mut self, record: &StepRecord) {
        self.records.push(record.clone());
    }
}

/// Sink that emits each record as a `trace` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&mut self, record: &StepRecord) {
        trace!(
            step = record.step,
            final_risk = record.final_risk,
            freeze_active = record.freeze_active,
            binding = ?record.binding,
            proposals = ?record.proposals,
            adjustments = ?record.adjustments,
            "step aggregated"
        );
    }
}
