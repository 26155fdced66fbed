//! Storage contract for step records.

use async_trait::async_trait;
use aurora_types::{OperationId, StepName, StepRecord};

use crate::Result;

/// Durable storage for step records.
///
/// A successful [`StateStore::save`] must be durable before it returns, and
/// reads are read-your-writes for the same operation. Records are
/// append-only; the writer stamps `timestamp` before saving.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Persist a record.
    async fn save(&self, record: &StepRecord) -> Result<()>;

    /// Load the most recent record for a specific step of an operation.
    async fn load(
        &self,
        operation_id: &OperationId,
        step: StepName,
    ) -> Result<Option<StepRecord>>;

    /// Load the most recently written record for an operation, whatever the
    /// step.
    async fn load_latest(&self, operation_id: &OperationId) -> Result<Option<StepRecord>>;

    /// Remove every record for an operation; returns the number removed.
    async fn delete(&self, operation_id: &OperationId) -> Result<u64>;
}
