//! Audit event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{OperationId, StepName};

/// How long audit rows are retained before the store expires them.
pub const AUDIT_RETENTION_SECS: i64 = 30 * 24 * 60 * 60;

/// Outcome recorded with an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Failed,
    Skipped,
    InProgress,
    Waiting,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Failed => "failed",
            AuditStatus::Skipped => "skipped",
            AuditStatus::InProgress => "in_progress",
            AuditStatus::Waiting => "waiting",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Step name plus ISO timestamp, unique enough for an append-only log.
    pub event_id: String,
    pub operation_id: OperationId,
    pub event_type: StepName,
    pub status: AuditStatus,
    pub timestamp: DateTime<Utc>,
    pub details: Map<String, Value>,
    pub environment: String,
    /// Unix seconds after which the row may be expired.
    pub ttl: i64,
}

impl AuditEvent {
    pub fn new(
        operation_id: OperationId,
        event_type: StepName,
        status: AuditStatus,
        timestamp: DateTime<Utc>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            event_id: format!("{}_{}", event_type, timestamp.to_rfc3339()),
            operation_id,
            event_type,
            status,
            timestamp,
            details: Map::new(),
            environment: environment.into(),
            ttl: timestamp.timestamp() + AUDIT_RETENTION_SECS,
        }
    }

    /// Attach a detail value. Unserializable values are dropped.
    pub fn detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.insert(key.into(), v);
        }
        self
    }

    /// Merge a detail map into the event.
    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details.extend(details);
        self
    }
}
