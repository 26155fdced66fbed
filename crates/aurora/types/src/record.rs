//! Persisted step outcomes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{OperationId, StepName};

/// The persisted outcome of one step execution.
///
/// Required columns are typed; step-specific payload fields (snapshot names
/// and ARNs, cluster identifiers, endpoints, statuses) live in the flattened
/// map so unknown keys written by newer code round-trip untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub operation_id: OperationId,
    pub step: StepName,
    /// Unix seconds at which the record was written.
    pub timestamp: i64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StepRecord {
    /// A successful outcome with no payload yet.
    pub fn success(operation_id: OperationId, step: StepName, timestamp: i64) -> Self {
        Self {
            operation_id,
            step,
            timestamp,
            success: true,
            error: None,
            fields: Map::new(),
        }
    }

    /// A failed outcome carrying an error string.
    pub fn failure(
        operation_id: OperationId,
        step: StepName,
        timestamp: i64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            operation_id,
            step,
            timestamp,
            success: false,
            error: Some(error.into()),
            fields: Map::new(),
        }
    }

    /// Attach a payload field. Values that fail to serialize are dropped,
    /// matching the best-effort contract of the sinks that consume records.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Merge a map of payload fields into the record.
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn i64_field(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// Sort key under which the record is stored: descending scans over
    /// `"{timestamp:010}#{step}"` yield the most recently written record
    /// first.
    pub fn sort_key(&self) -> String {
        format!("{:010}#{}", self.timestamp, self.step)
    }
}
