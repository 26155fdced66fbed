//! Audit and metric sinks.
//!
//! Both sinks are best-effort collaborators: the engine logs their failures
//! and keeps going, so implementations must never panic and should be cheap
//! to call once per step.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod audit;
mod error;
mod metrics;

pub use audit::{AuditSink, DynamoAuditSink, MemoryAuditSink};
pub use error::{ObservabilityError, Result};
pub use metrics::{CloudWatchMetricsSink, MemoryMetricsSink, MetricsSink};
