//! RDS cluster adapter.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_rds::types::{DbCluster, Tag};
use tracing::debug;

use aurora_engine::ports::{
    CloudError, CloudErrorKind, ClusterControl, ClusterInfo, RestoreSpec,
};

use crate::classify::classify_error;
use crate::clients::AwsClients;
use crate::retry::with_backoff;

/// Cluster describe, delete, and restore over the RDS API.
pub struct RdsClusterControl {
    clients: Arc<AwsClients>,
}

impl RdsClusterControl {
    pub fn new(clients: Arc<AwsClients>) -> Self {
        Self { clients }
    }
}

fn cluster_info(cluster: &DbCluster) -> ClusterInfo {
    ClusterInfo {
        identifier: cluster.db_cluster_identifier().unwrap_or_default().to_string(),
        status: cluster.status().unwrap_or_default().to_string(),
        endpoint: cluster.endpoint().map(str::to_string),
        port: cluster.port(),
        engine: cluster.engine().map(str::to_string),
        engine_version: cluster.engine_version().map(str::to_string),
        db_subnet_group: cluster.db_subnet_group().map(str::to_string),
        vpc_security_group_ids: cluster
            .vpc_security_groups()
            .iter()
            .filter_map(|sg| sg.vpc_security_group_id())
            .map(str::to_string)
            .collect(),
    }
}

#[async_trait]
impl ClusterControl for RdsClusterControl {
    async fn find_cluster(
        &self,
        region: &str,
        cluster_id: &str,
    ) -> Result<Option<ClusterInfo>, CloudError> {
        let client = self.clients.rds(region).await;
        let result = with_backoff("describe_db_clusters", || {
            let client = client.clone();
            async move {
                client
                    .describe_db_clusters()
                    .db_cluster_identifier(cluster_id)
                    .send()
                    .await
                    .map_err(|err| classify_error("describe_db_clusters", err))
            }
        })
        .await;

        match result {
            Ok(output) => Ok(output.db_clusters().first().map(cluster_info)),
            Err(err) if err.kind == CloudErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn delete_cluster(
        &self,
        region: &str,
        cluster_id: &str,
        skip_final_snapshot: bool,
    ) -> Result<(), CloudError> {
        let client = self.clients.rds(region).await;
        with_backoff("delete_db_cluster", || {
            let client = client.clone();
            async move {
                client
                    .delete_db_cluster()
                    .db_cluster_identifier(cluster_id)
                    .skip_final_snapshot(skip_final_snapshot)
                    .send()
                    .await
                    .map_err(|err| classify_error("delete_db_cluster", err))
            }
        })
        .await?;
        Ok(())
    }

    async fn restore_cluster(
        &self,
        region: &str,
        spec: &RestoreSpec,
    ) -> Result<ClusterInfo, CloudError> {
        let client = self.clients.rds(region).await;

        // Storage encryption is derived from the snapshot and the KMS key;
        // the backup retention window is a post-restore modification. The
        // restore API accepts neither directly.
        if spec.storage_encrypted.is_some() {
            debug!(cluster_id = %spec.cluster_id, "storage encryption follows the snapshot");
        }
        if spec.backup_retention_period.is_some() {
            debug!(cluster_id = %spec.cluster_id, "backup retention applies after restore");
        }

        let tags: Vec<Tag> = spec
            .tags
            .iter()
            .map(|(key, value)| Tag::builder().key(key).value(value).build())
            .collect();

        let output = with_backoff("restore_db_cluster_from_snapshot", || {
            let client = client.clone();
            let tags = tags.clone();
            async move {
                client
                    .restore_db_cluster_from_snapshot()
                    .db_cluster_identifier(&spec.cluster_id)
                    .snapshot_identifier(&spec.snapshot_id)
                    .engine(&spec.engine)
                    .set_engine_version(spec.engine_version.clone())
                    .set_port(spec.port)
                    .set_db_subnet_group_name(spec.db_subnet_group_name.clone())
                    .set_vpc_security_group_ids(if spec.vpc_security_group_ids.is_empty() {
                        None
                    } else {
                        Some(spec.vpc_security_group_ids.clone())
                    })
                    .set_availability_zones(if spec.availability_zones.is_empty() {
                        None
                    } else {
                        Some(spec.availability_zones.clone())
                    })
                    .set_enable_iam_database_authentication(spec.enable_iam_database_authentication)
                    .set_kms_key_id(spec.kms_key_id.clone())
                    .set_deletion_protection(spec.deletion_protection)
                    .set_db_cluster_parameter_group_name(
                        spec.db_cluster_parameter_group_name.clone(),
                    )
                    .set_tags(Some(tags))
                    .send()
                    .await
                    .map_err(|err| classify_error("restore_db_cluster_from_snapshot", err))
            }
        })
        .await?;

        output
            .db_cluster()
            .map(cluster_info)
            .ok_or_else(|| CloudError::other("restore_db_cluster_from_snapshot returned no cluster"))
    }
}
