//! Step dispatch port.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use aurora_types::{OperationId, StepName};

use super::CloudError;

/// A request to invoke a step asynchronously.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub operation_id: OperationId,
    pub step: StepName,
    /// Event payload for the invoked step; always carries the operation id.
    pub payload: Map<String, Value>,
    /// Defer visibility by approximately this long (polling loops).
    pub delay: Option<Duration>,
}

/// Enqueues asynchronous step invocations. Delivery is at-least-once;
/// handlers tolerate duplicates.
#[async_trait]
pub trait StepDispatcher: Send + Sync {
    async fn dispatch(&self, request: DispatchRequest) -> Result<(), CloudError>;
}
