//! Restore the new cluster from the copied snapshot.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use aurora_types::StepName;

use crate::ports::{CloudErrorKind, RestoreSpec, SnapshotScope};
use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Tag recorded on every restored cluster.
const CREATED_BY: &str = "aurora-restore-pipeline";

/// Restores the target cluster from the copied snapshot. An already
/// existing target cluster is a success-with-note that terminates the
/// branch; duplicate deliveries therefore never restore twice.
pub struct RestoreSnapshotHandler;

#[async_trait]
impl StepHandler for RestoreSnapshotHandler {
    fn step(&self) -> StepName {
        StepName::RestoreSnapshot
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;

        if let Some(existing) = services
            .clusters
            .find_cluster(&config.target_region, &config.target_cluster_id)
            .await?
        {
            info!(
                operation_id = %ctx.operation_id,
                cluster_id = %config.target_cluster_id,
                status = %existing.status,
                "target cluster already exists, not restoring"
            );
            return Ok(StepOutcome::terminal(format!(
                "Cluster {} already exists",
                config.target_cluster_id
            ))
            .with("restore_status", "already_exists")
            .with("cluster_status", &existing.status));
        }

        let target_snapshot_name = ctx.require_carried("target_snapshot_name")?;
        // Cross-region copies are manual snapshots; in same-region mode the
        // carried name is the original daily snapshot, so search every scope.
        let mut snapshot = None;
        for scope in SnapshotScope::SEARCH_ORDER {
            snapshot = services
                .snapshots
                .find_snapshot(&config.target_region, &target_snapshot_name, scope)
                .await?;
            if snapshot.is_some() {
                break;
            }
        }
        let snapshot = snapshot.ok_or_else(|| {
            StepError::NotFound(format!(
                "Snapshot {target_snapshot_name} not found in target region"
            ))
        })?;
        if snapshot.status != "available" {
            return Err(StepError::StepFailed(format!(
                "Snapshot {target_snapshot_name} is not available (status: {})",
                snapshot.status
            )));
        }
        let engine = snapshot.engine.clone().ok_or_else(|| {
            StepError::StepFailed(format!(
                "Snapshot {target_snapshot_name} does not report an engine"
            ))
        })?;

        let spec = RestoreSpec {
            cluster_id: config.target_cluster_id.clone(),
            snapshot_id: target_snapshot_name.clone(),
            engine,
            engine_version: snapshot.engine_version.clone(),
            port: Some(i32::from(config.port)),
            db_subnet_group_name: config.db_subnet_group_name.clone(),
            vpc_security_group_ids: config.vpc_security_group_ids.clone(),
            availability_zones: config.availability_zones.clone(),
            enable_iam_database_authentication: config.enable_iam_database_authentication,
            storage_encrypted: config.storage_encrypted,
            kms_key_id: config.kms_key_id.clone(),
            deletion_protection: Some(config.deletion_protection),
            backup_retention_period: config.backup_retention_period,
            db_cluster_parameter_group_name: config.db_cluster_parameter_group_name.clone(),
            tags: vec![
                ("Name".to_string(), config.target_cluster_id.clone()),
                ("Environment".to_string(), config.environment.clone()),
                ("CreatedBy".to_string(), CREATED_BY.to_string()),
                ("OperationId".to_string(), ctx.operation_id.to_string()),
            ],
        };

        let cluster = match services
            .clusters
            .restore_cluster(&config.target_region, &spec)
            .await
        {
            Ok(cluster) => cluster,
            Err(err) if err.kind == CloudErrorKind::AlreadyExists => {
                // Duplicate delivery beat us to it.
                return Ok(StepOutcome::terminal(format!(
                    "Cluster {} already exists",
                    config.target_cluster_id
                ))
                .with("restore_status", "already_exists"));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(StepOutcome::advance_after(
            format!(
                "Restore of cluster {} from {} initiated",
                config.target_cluster_id, target_snapshot_name
            ),
            StepName::CheckRestoreStatus,
            Duration::from_secs(config.restore_status_retry_delay),
        )
        .with("target_snapshot_name", &target_snapshot_name)
        .with("restore_status", &cluster.status))
    }
}
