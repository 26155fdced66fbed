//! In-memory state store for development and testing.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;

use aurora_types::{OperationId, StepName, StepRecord};

use crate::traits::StateStore;
use crate::Result;

/// In-memory implementation of [`StateStore`].
///
/// Rows are indexed per operation by sort key, so "latest" reads mirror the
/// descending-scan semantics of the DynamoDB backend. Not suitable for
/// production use.
#[derive(Default)]
pub struct InMemoryStateStore {
    rows: DashMap<String, BTreeMap<String, StepRecord>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows across all operations.
    pub fn total_count(&self) -> usize {
        self.rows.iter().map(|ops| ops.value().len()).sum()
    }

    /// All records for an operation in write order (ascending sort key).
    pub fn records_for(&self, operation_id: &OperationId) -> Vec<StepRecord> {
        self.rows
            .get(operation_id.as_str())
            .map(|ops| ops.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn save(&self, record: &StepRecord) -> Result<()> {
        self.rows
            .entry(record.operation_id.as_str().to_string())
            .or_default()
            .insert(record.sort_key(), record.clone());
        Ok(())
    }

    async fn load(
        &self,
        operation_id: &OperationId,
        step: StepName,
    ) -> Result<Option<StepRecord>> {
        Ok(self.rows.get(operation_id.as_str()).and_then(|ops| {
            ops.values().rev().find(|record| record.step == step).cloned()
        }))
    }

    async fn load_latest(&self, operation_id: &OperationId) -> Result<Option<StepRecord>> {
        Ok(self
            .rows
            .get(operation_id.as_str())
            .and_then(|ops| ops.values().next_back().cloned()))
    }

    async fn delete(&self, operation_id: &OperationId) -> Result<u64> {
        Ok(self
            .rows
            .remove(operation_id.as_str())
            .map(|(_, ops)| ops.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op() -> OperationId {
        OperationId::new("op-1718000000-abcd1234")
    }

    #[tokio::test]
    async fn test_save_and_load_latest() {
        let store = InMemoryStateStore::new();
        store
            .save(&StepRecord::success(op(), StepName::SnapshotCheck, 10))
            .await
            .unwrap();
        store
            .save(&StepRecord::success(op(), StepName::CopySnapshot, 20))
            .await
            .unwrap();

        let latest = store.load_latest(&op()).await.unwrap().unwrap();
        assert_eq!(latest.step, StepName::CopySnapshot);
    }

    #[tokio::test]
    async fn test_latest_is_by_timestamp_not_step_name() {
        let store = InMemoryStateStore::new();
        // verify_restore sorts after snapshot_check lexically, but the
        // later write must win regardless.
        store
            .save(&StepRecord::success(op(), StepName::VerifyRestore, 10))
            .await
            .unwrap();
        store
            .save(&StepRecord::success(op(), StepName::SnapshotCheck, 20))
            .await
            .unwrap();

        let latest = store.load_latest(&op()).await.unwrap().unwrap();
        assert_eq!(latest.step, StepName::SnapshotCheck);
    }

    #[tokio::test]
    async fn test_load_specific_step_returns_newest() {
        let store = InMemoryStateStore::new();
        store
            .save(
                &StepRecord::success(op(), StepName::CheckCopyStatus, 10).with("copy_status", "copying"),
            )
            .await
            .unwrap();
        store
            .save(
                &StepRecord::success(op(), StepName::CheckCopyStatus, 30)
                    .with("copy_status", "available"),
            )
            .await
            .unwrap();

        let record = store.load(&op(), StepName::CheckCopyStatus).await.unwrap().unwrap();
        assert_eq!(record.str_field("copy_status"), Some("available"));
    }

    #[tokio::test]
    async fn test_delete_removes_all_rows() {
        let store = InMemoryStateStore::new();
        store
            .save(&StepRecord::success(op(), StepName::SnapshotCheck, 10))
            .await
            .unwrap();
        store
            .save(&StepRecord::success(op(), StepName::CopySnapshot, 20))
            .await
            .unwrap();

        assert_eq!(store.delete(&op()).await.unwrap(), 2);
        assert!(store.load_latest(&op()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_operations_are_isolated() {
        let store = InMemoryStateStore::new();
        let other = OperationId::new("op-1718000001-ffffffff");
        store
            .save(&StepRecord::success(op(), StepName::SnapshotCheck, 10))
            .await
            .unwrap();
        store
            .save(&StepRecord::failure(other.clone(), StepName::SnapshotCheck, 11, "nope"))
            .await
            .unwrap();

        assert!(store.load_latest(&op()).await.unwrap().unwrap().success);
        assert!(!store.load_latest(&other).await.unwrap().unwrap().success);
    }
}
