//! Observability module for batch and trial metrics.
//!
//! Metrics are recorded through the `metrics` facade. No exporter is
//! installed here; without a recorder every call is a no-op.

mod metrics;

pub use self::metrics::{record_batch, record_invalid_trial, record_trial};
