//! DynamoDB-backed state store.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::{Map, Value};
use tracing::debug;

use aurora_types::{OperationId, StepName, StepRecord};

use crate::attr::{from_attr, to_attr};
use crate::traits::StateStore;
use crate::{Result, StateError};

const SORT_KEY: &str = "sk";

/// DynamoDB implementation of [`StateStore`].
///
/// Table schema: partition key `operation_id` (S), sort key `sk` (S) holding
/// `"{timestamp:010}#{step}"`. All other record fields are stored as plain
/// item attributes so operators can read them directly in the console.
#[derive(Clone)]
pub struct DynamoStateStore {
    client: Client,
    table: String,
}

impl DynamoStateStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn to_item(record: &StepRecord) -> Result<HashMap<String, AttributeValue>> {
        let value = serde_json::to_value(record)
            .map_err(|err| StateError::Serialization(err.to_string()))?;
        let Value::Object(map) = value else {
            return Err(StateError::Serialization("record is not an object".into()));
        };
        let mut item: HashMap<String, AttributeValue> = map
            .iter()
            .map(|(key, value)| (key.clone(), to_attr(value)))
            .collect();
        item.insert(SORT_KEY.to_string(), AttributeValue::S(record.sort_key()));
        Ok(item)
    }

    fn from_item(item: &HashMap<String, AttributeValue>) -> Result<StepRecord> {
        let map: Map<String, Value> = item
            .iter()
            .filter(|(key, _)| key.as_str() != SORT_KEY)
            .map(|(key, value)| (key.clone(), from_attr(value)))
            .collect();
        serde_json::from_value(Value::Object(map))
            .map_err(|err| StateError::Serialization(err.to_string()))
    }

    async fn query_desc(
        &self,
        operation_id: &OperationId,
        limit: Option<i32>,
    ) -> Result<Vec<HashMap<String, AttributeValue>>> {
        let mut request = self
            .client
            .query()
            .table_name(&self.table)
            .key_condition_expression("operation_id = :op")
            .expression_attribute_values(":op", AttributeValue::S(operation_id.as_str().into()))
            .scan_index_forward(false);
        if let Some(limit) = limit {
            request = request.limit(limit);
        }
        let response = request
            .send()
            .await
            .map_err(|err| StateError::Storage(err.to_string()))?;
        Ok(response.items().to_vec())
    }
}

#[async_trait]
impl StateStore for DynamoStateStore {
    async fn save(&self, record: &StepRecord) -> Result<()> {
        let item = Self::to_item(record)?;
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| StateError::Storage(err.to_string()))?;
        debug!(
            operation_id = %record.operation_id,
            step = %record.step,
            success = record.success,
            "saved step record"
        );
        Ok(())
    }

    async fn load(
        &self,
        operation_id: &OperationId,
        step: StepName,
    ) -> Result<Option<StepRecord>> {
        // The step filter applies after the key condition, so scan newest
        // first and stop at the first match.
        let items = self.query_desc(operation_id, None).await?;
        for item in &items {
            let record = Self::from_item(item)?;
            if record.step == step {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    async fn load_latest(&self, operation_id: &OperationId) -> Result<Option<StepRecord>> {
        let items = self.query_desc(operation_id, Some(1)).await?;
        items.first().map(Self::from_item).transpose()
    }

    async fn delete(&self, operation_id: &OperationId) -> Result<u64> {
        let items = self.query_desc(operation_id, None).await?;
        let mut removed = 0u64;
        for item in &items {
            let Some(sort_key) = item.get(SORT_KEY) else {
                continue;
            };
            self.client
                .delete_item()
                .table_name(&self.table)
                .key(
                    "operation_id",
                    AttributeValue::S(operation_id.as_str().into()),
                )
                .key(SORT_KEY, sort_key.clone())
                .send()
                .await
                .map_err(|err| StateError::Storage(err.to_string()))?;
            removed += 1;
        }
        Ok(removed)
    }
}
