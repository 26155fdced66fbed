//! Handler response envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{OperationId, StepName};

/// Response returned by every step handler.
///
/// Status codes: 200 completed or already satisfied, 202 in progress
/// (self-rescheduled), 400 validation or precondition failure, 404 expected
/// artifact terminally absent, 500 internal or cloud error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

/// Body of a step response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseBody {
    pub message: String,
    pub operation_id: OperationId,
    pub step: StepName,
    pub success: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StepResponse {
    fn new(
        status_code: u16,
        success: bool,
        operation_id: OperationId,
        step: StepName,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            body: ResponseBody {
                message: message.into(),
                operation_id,
                step,
                success,
                fields: Map::new(),
            },
        }
    }

    /// 200: step completed or already satisfied.
    pub fn completed(operation_id: OperationId, step: StepName, message: impl Into<String>) -> Self {
        Self::new(200, true, operation_id, step, message)
    }

    /// 202: step in progress, self-rescheduled.
    pub fn in_progress(
        operation_id: OperationId,
        step: StepName,
        message: impl Into<String>,
    ) -> Self {
        Self::new(202, true, operation_id, step, message)
    }

    /// 400: validation or precondition failure.
    pub fn bad_request(
        operation_id: OperationId,
        step: StepName,
        message: impl Into<String>,
    ) -> Self {
        Self::new(400, false, operation_id, step, message)
    }

    /// 404: an expected artifact is absent in a terminal sense.
    pub fn not_found(operation_id: OperationId, step: StepName, message: impl Into<String>) -> Self {
        Self::new(404, false, operation_id, step, message)
    }

    /// 500: unhandled internal or cloud error.
    pub fn internal_error(
        operation_id: OperationId,
        step: StepName,
        message: impl Into<String>,
    ) -> Self {
        Self::new(500, false, operation_id, step, message)
    }

    /// Attach a body field. Unserializable values are dropped.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.body.fields.insert(key.into(), v);
        }
        self
    }

    /// Merge a map of body fields.
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.body.fields.extend(fields);
        self
    }

    pub fn is_success(&self) -> bool {
        self.body.success
    }
}
