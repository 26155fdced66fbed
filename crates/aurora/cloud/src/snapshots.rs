//! RDS cluster snapshot adapter.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_rds::types::DbClusterSnapshot;
use tracing::debug;

use aurora_engine::ports::{
    CloudError, CloudErrorKind, CopySnapshotRequest, SnapshotInfo, SnapshotScope, SnapshotStore,
};

use crate::classify::classify_error;
use crate::clients::AwsClients;
use crate::retry::with_backoff;

/// Snapshot lookup, copy, and deletion over the RDS API.
pub struct RdsSnapshotStore {
    clients: Arc<AwsClients>,
}

impl RdsSnapshotStore {
    pub fn new(clients: Arc<AwsClients>) -> Self {
        Self { clients }
    }
}

fn snapshot_info(snapshot: &DbClusterSnapshot) -> SnapshotInfo {
    SnapshotInfo {
        identifier: snapshot
            .db_cluster_snapshot_identifier()
            .unwrap_or_default()
            .to_string(),
        arn: snapshot
            .db_cluster_snapshot_arn()
            .unwrap_or_default()
            .to_string(),
        status: snapshot.status().unwrap_or_default().to_string(),
        cluster_id: snapshot.db_cluster_identifier().map(str::to_string),
        engine: snapshot.engine().map(str::to_string),
        engine_version: snapshot.engine_version().map(str::to_string),
        encrypted: snapshot.storage_encrypted().unwrap_or(false),
        kms_key_id: snapshot.kms_key_id().map(str::to_string),
        allocated_storage: snapshot.allocated_storage(),
        created_at: snapshot
            .snapshot_create_time()
            .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
    }
}

#[async_trait]
impl SnapshotStore for RdsSnapshotStore {
    async fn find_snapshot(
        &self,
        region: &str,
        snapshot_id: &str,
        scope: SnapshotScope,
    ) -> Result<Option<SnapshotInfo>, CloudError> {
        let client = self.clients.rds(region).await;
        let result = with_backoff("describe_db_cluster_snapshots", || {
            let client = client.clone();
            async move {
                let mut request = client
                    .describe_db_cluster_snapshots()
                    .db_cluster_snapshot_identifier(snapshot_id)
                    .snapshot_type(scope.as_str());
                if scope == SnapshotScope::Shared {
                    request = request.include_shared(true);
                }
                request
                    .send()
                    .await
                    .map_err(|err| classify_error("describe_db_cluster_snapshots", err))
            }
        })
        .await;

        match result {
            Ok(output) => Ok(output.db_cluster_snapshots().first().map(snapshot_info)),
            Err(err) if err.kind == CloudErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn copy_snapshot(
        &self,
        region: &str,
        request: &CopySnapshotRequest,
    ) -> Result<SnapshotInfo, CloudError> {
        let client = self.clients.rds(region).await;
        debug!(
            source = %request.source_snapshot_arn,
            target = %request.target_snapshot_id,
            source_region = %request.source_region,
            "starting snapshot copy"
        );
        let output = with_backoff("copy_db_cluster_snapshot", || {
            let client = client.clone();
            async move {
                client
                    .copy_db_cluster_snapshot()
                    .source_db_cluster_snapshot_identifier(&request.source_snapshot_arn)
                    .target_db_cluster_snapshot_identifier(&request.target_snapshot_id)
                    .copy_tags(request.copy_tags)
                    .set_kms_key_id(request.kms_key_id.clone())
                    .send()
                    .await
                    .map_err(|err| classify_error("copy_db_cluster_snapshot", err))
            }
        })
        .await?;

        output
            .db_cluster_snapshot()
            .map(snapshot_info)
            .ok_or_else(|| CloudError::other("copy_db_cluster_snapshot returned no snapshot"))
    }

    async fn delete_snapshot(&self, region: &str, snapshot_id: &str) -> Result<bool, CloudError> {
        let client = self.clients.rds(region).await;
        let result = with_backoff("delete_db_cluster_snapshot", || {
            let client = client.clone();
            async move {
                client
                    .delete_db_cluster_snapshot()
                    .db_cluster_snapshot_identifier(snapshot_id)
                    .send()
                    .await
                    .map_err(|err| classify_error("delete_db_cluster_snapshot", err))
            }
        })
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if err.kind == CloudErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}
