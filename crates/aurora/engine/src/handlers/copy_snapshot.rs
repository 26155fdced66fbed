//! Copy the located snapshot into the target region.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use aurora_types::StepName;

use crate::ports::{CloudErrorKind, CopySnapshotRequest, SnapshotScope};
use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Issues the cross-region snapshot copy. Same-region operations record a
/// synthetic completion without any copy call, and an existing target
/// snapshot short-circuits the copy (at-least-once dispatch).
pub struct CopySnapshotHandler;

#[async_trait]
impl StepHandler for CopySnapshotHandler {
    fn step(&self) -> StepName {
        StepName::CopySnapshot
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;
        let snapshot_name = ctx.require_carried("snapshot_name")?;
        let snapshot_arn = ctx.require_carried("snapshot_arn")?;

        if config.same_region() {
            return Ok(StepOutcome::skipped(
                "source and target share a region, no copy required",
                StepName::CheckCopyStatus,
            )
            .with("target_snapshot_name", &snapshot_name)
            .with("target_snapshot_arn", &snapshot_arn)
            .with("copy_status", "available")
            .with("copy_skipped", true));
        }

        let target_snapshot_name = format!("{snapshot_name}-copy");
        let delay = Duration::from_secs(config.copy_status_retry_delay);

        // Pre-existence check keeps re-delivery from starting a second copy.
        let existing = services
            .snapshots
            .find_snapshot(&config.target_region, &target_snapshot_name, SnapshotScope::Manual)
            .await?;
        if let Some(snapshot) = existing {
            info!(
                operation_id = %ctx.operation_id,
                target_snapshot_name = %target_snapshot_name,
                status = %snapshot.status,
                "target snapshot already present, skipping copy"
            );
            return Ok(StepOutcome::advance_after(
                format!("Snapshot copy {target_snapshot_name} already present"),
                StepName::CheckCopyStatus,
                delay,
            )
            .with("target_snapshot_name", &snapshot.identifier)
            .with("target_snapshot_arn", &snapshot.arn)
            .with("copy_status", &snapshot.status));
        }

        let request = CopySnapshotRequest {
            source_snapshot_arn: snapshot_arn,
            target_snapshot_id: target_snapshot_name.clone(),
            source_region: config.source_region.clone(),
            kms_key_id: config.kms_key_id.clone(),
            copy_tags: true,
        };
        let copied = match services
            .snapshots
            .copy_snapshot(&config.target_region, &request)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(err) if err.kind == CloudErrorKind::AlreadyExists => {
                // Lost the race against a duplicate delivery; the checker
                // will observe whichever copy is in flight.
                return Ok(StepOutcome::advance_after(
                    format!("Snapshot copy {target_snapshot_name} already in flight"),
                    StepName::CheckCopyStatus,
                    delay,
                )
                .with("target_snapshot_name", &target_snapshot_name)
                .with("copy_status", "copying"));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(StepOutcome::advance_after(
            format!("Snapshot copy {target_snapshot_name} started"),
            StepName::CheckCopyStatus,
            delay,
        )
        .with("target_snapshot_name", &copied.identifier)
        .with("target_snapshot_arn", &copied.arn)
        .with("copy_status", &copied.status))
    }
}
