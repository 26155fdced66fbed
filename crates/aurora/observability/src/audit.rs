//! Audit sinks for the append-only operation log.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use parking_lot::RwLock;
use serde_json::Value;

use aurora_types::AuditEvent;

use crate::{ObservabilityError, Result};

/// Trait for audit sinks.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append an audit event.
    async fn record(&self, event: &AuditEvent) -> Result<()>;
}

/// In-memory audit sink for testing.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        self.events.write().push(event.clone());
        Ok(())
    }
}

/// DynamoDB audit sink. Rows carry a `ttl` attribute so the table's TTL
/// policy expires them after the retention window.
#[derive(Clone)]
pub struct DynamoAuditSink {
    client: Client,
    table: String,
}

impl DynamoAuditSink {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl AuditSink for DynamoAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        let value = serde_json::to_value(event)
            .map_err(|err| ObservabilityError::Serialization(err.to_string()))?;
        let Value::Object(map) = value else {
            return Err(ObservabilityError::Serialization(
                "audit event is not an object".into(),
            ));
        };
        let mut request = self.client.put_item().table_name(&self.table);
        for (key, value) in &map {
            request = request.item(key, to_attr(value));
        }
        request
            .send()
            .await
            .map_err(|err| ObservabilityError::Sink(err.to_string()))?;
        Ok(())
    }
}

fn to_attr(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attr).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(key, value)| (key.clone(), to_attr(value)))
                .collect(),
        ),
    }
}
