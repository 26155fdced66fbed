//! Tear down a stale target cluster before restoring over it.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use aurora_types::StepName;

use crate::ports::CloudErrorKind;
use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Cluster states in which a delete call is accepted.
const DELETABLE_STATES: &[&str] = &["available", "stopped", "failed"];

/// Deletes the existing target cluster when one is present and deletable;
/// otherwise records a skip and moves straight to the restore.
pub struct DeleteRdsHandler;

#[async_trait]
impl StepHandler for DeleteRdsHandler {
    fn step(&self) -> StepName {
        StepName::DeleteRds
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;
        let cluster = services
            .clusters
            .find_cluster(&config.target_region, &config.target_cluster_id)
            .await?;

        let cluster = match cluster {
            None => {
                return Ok(StepOutcome::skipped(
                    format!(
                        "Cluster {} does not exist, skipping deletion",
                        config.target_cluster_id
                    ),
                    StepName::RestoreSnapshot,
                )
                .with("delete_skipped", true)
                .with("delete_reason", "not_found"));
            }
            Some(cluster) => cluster,
        };

        if !DELETABLE_STATES.contains(&cluster.status.as_str()) {
            return Ok(StepOutcome::skipped(
                format!(
                    "Cluster {} is {}, deletion not required",
                    config.target_cluster_id, cluster.status
                ),
                StepName::RestoreSnapshot,
            )
            .with("delete_skipped", true)
            .with("delete_reason", "not_deletable")
            .with("cluster_status", &cluster.status));
        }

        match services
            .clusters
            .delete_cluster(
                &config.target_region,
                &config.target_cluster_id,
                config.skip_final_snapshot,
            )
            .await
        {
            Ok(()) => {
                info!(
                    operation_id = %ctx.operation_id,
                    cluster_id = %config.target_cluster_id,
                    "cluster deletion initiated"
                );
                Ok(StepOutcome::advance_after(
                    format!("Deletion of cluster {} initiated", config.target_cluster_id),
                    StepName::CheckDeleteStatus,
                    Duration::from_secs(config.delete_status_retry_delay),
                )
                .with("delete_initiated", true)
                .with("delete_skipped", false))
            }
            // Lost a race: the cluster vanished or left a deletable state
            // between describe and delete. Both mean deletion is not ours
            // to do.
            Err(err)
                if matches!(
                    err.kind,
                    CloudErrorKind::NotFound | CloudErrorKind::InvalidState
                ) =>
            {
                Ok(StepOutcome::skipped(
                    format!(
                        "Cluster {} no longer deletable ({}), skipping",
                        config.target_cluster_id, err.kind
                    ),
                    StepName::RestoreSnapshot,
                )
                .with("delete_skipped", true)
                .with("delete_reason", "state_changed"))
            }
            Err(err) => Err(err.into()),
        }
    }
}
