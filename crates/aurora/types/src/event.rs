//! Step event payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The payload a step is invoked with.
///
/// Known fields are typed; everything else is carried in the flattened map
/// and passed through untouched for forward compatibility. The optional
/// `body` map covers invocations wrapped by an API front (the operation id
/// may arrive there instead of at the top level).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// ISO date (`YYYY-MM-DD`); only meaningful for the entry step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StepEvent {
    /// An event carrying only an operation id.
    pub fn for_operation(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: Some(operation_id.into()),
            ..Self::default()
        }
    }

    /// Build an event from a payload map produced by a previous step.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let mut event = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "operation_id" => event.operation_id = value.as_str().map(str::to_string),
                "date" => event.date = value.as_str().map(str::to_string),
                _ => {
                    event.extra.insert(key, value);
                }
            }
        }
        event
    }

    /// Resolve the operation id from the top level or the wrapped body.
    pub fn resolve_operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref().or_else(|| {
            self.body
                .as_ref()
                .and_then(|body| body.get("operation_id"))
                .and_then(Value::as_str)
        })
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    pub fn i64_field(&self, key: &str) -> Option<i64> {
        self.extra.get(key).and_then(Value::as_i64)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: impl Serialize) {
        if let Ok(v) = serde_json::to_value(value) {
            self.extra.insert(key.into(), v);
        }
    }
}
