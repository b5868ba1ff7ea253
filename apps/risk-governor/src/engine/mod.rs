//! Per-step decision pipeline: aggregation, gating and telemetry.

mod aggregator;
mod gating;
mod telemetry;

pub use aggregator::{Adjustment, AggregationResult, aggregate};
pub use gating::{binding_cap, in_session, is_blackout};
pub use telemetry::{MemorySink, NullSink, StepRecord, TelemetrySink, TracingSink};
