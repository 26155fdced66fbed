//! Archive the copied snapshot after a verified restore.

use async_trait::async_trait;
use tracing::info;

use aurora_types::StepName;

use crate::ports::SnapshotScope;
use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Deletes the cross-region copy once the restore is verified. Idempotent:
/// a second invocation finds nothing and records `skipped`. Same-region
/// operations never had a copy, so the daily snapshot is left alone.
pub struct ArchiveSnapshotHandler;

#[async_trait]
impl StepHandler for ArchiveSnapshotHandler {
    fn step(&self) -> StepName {
        StepName::ArchiveSnapshot
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;

        if !config.archive_snapshot {
            return Ok(StepOutcome::skipped(
                "snapshot archiving disabled by configuration",
                StepName::SnsNotification,
            )
            .with("archive_status", "disabled"));
        }

        if config.same_region() {
            return Ok(StepOutcome::skipped(
                "no cross-region copy to archive",
                StepName::SnsNotification,
            )
            .with("archive_status", "skipped"));
        }

        let target_snapshot_name = ctx.require_carried("target_snapshot_name")?;
        let snapshot = services
            .snapshots
            .find_snapshot(&config.target_region, &target_snapshot_name, SnapshotScope::Manual)
            .await?;

        if snapshot.is_none() {
            return Ok(StepOutcome::skipped(
                format!("Snapshot {target_snapshot_name} already absent"),
                StepName::SnsNotification,
            )
            .with("archive_status", "skipped"));
        }

        let deleted = services
            .snapshots
            .delete_snapshot(&config.target_region, &target_snapshot_name)
            .await?;
        let archive_status = if deleted { "deleted" } else { "skipped" };
        info!(
            operation_id = %ctx.operation_id,
            target_snapshot_name = %target_snapshot_name,
            archive_status,
            "snapshot archived"
        );

        Ok(StepOutcome::advance(
            format!("Snapshot {target_snapshot_name} archived"),
            StepName::SnsNotification,
        )
        .with("archive_status", archive_status)
        .with("target_snapshot_name", &target_snapshot_name))
    }
}
