//! Shared domain types for the Aurora restore pipeline.
//!
//! Everything that crosses a crate boundary lives here: operation and step
//! identifiers, the persisted `StepRecord`, audit and metric shapes, the
//! step event payload, and the response envelope returned by every handler.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod audit;
mod event;
mod ids;
mod metric;
mod record;
mod response;
mod step;
pub mod validate;

pub use audit::{AuditEvent, AuditStatus, AUDIT_RETENTION_SECS};
pub use event::StepEvent;
pub use ids::OperationId;
pub use metric::{Metric, MetricUnit, METRIC_NAMESPACE};
pub use record::StepRecord;
pub use response::{ResponseBody, StepResponse};
pub use step::{StepName, UnknownStep};
pub use validate::ValidationError;
