//! Poll the snapshot copy until it is available.

use std::time::Duration;

use async_trait::async_trait;

use aurora_types::StepName;

use crate::poll::{classify, MissingPolicy, PollSpec, PollVerdict};
use crate::ports::SnapshotScope;
use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

const SPEC: PollSpec = PollSpec {
    advance_on: &["available"],
    fail_on: &["failed"],
    missing: MissingPolicy::Wait,
};

/// Polling state machine over the copied snapshot's status. A snapshot not
/// visible yet counts as waiting, bounded by `max_copy_attempts`.
pub struct CheckCopyStatusHandler;

#[async_trait]
impl StepHandler for CheckCopyStatusHandler {
    fn step(&self) -> StepName {
        StepName::CheckCopyStatus
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;

        if config.same_region() {
            return Ok(StepOutcome::advance(
                "source and target share a region, copy already satisfied",
                StepName::DeleteRds,
            )
            .with("copy_status", "available"));
        }

        let target_snapshot_name = ctx.require_carried("target_snapshot_name")?;
        let attempts = ctx.carried_i64("copy_check_attempts").unwrap_or(0) + 1;

        let snapshot = services
            .snapshots
            .find_snapshot(&config.target_region, &target_snapshot_name, SnapshotScope::Manual)
            .await?;

        match classify(snapshot.as_ref().map(|s| s.status.as_str()), &SPEC) {
            PollVerdict::Advance => {
                let snapshot = snapshot.expect("available snapshot was described");
                Ok(StepOutcome::advance(
                    format!("Snapshot copy {target_snapshot_name} is available"),
                    StepName::DeleteRds,
                )
                .with("target_snapshot_name", &snapshot.identifier)
                .with("target_snapshot_arn", &snapshot.arn)
                .with("copy_status", "available"))
            }
            PollVerdict::Fail(status) => Err(StepError::StepFailed(format!(
                "Snapshot copy failed with status: {status}"
            ))),
            PollVerdict::Wait(status) => {
                if attempts >= i64::from(config.max_copy_attempts) {
                    return Err(StepError::StepFailed(format!(
                        "Snapshot copy {target_snapshot_name} not available after {attempts} checks"
                    )));
                }
                Ok(StepOutcome::waiting(
                    format!("Snapshot copy {target_snapshot_name} is {status}"),
                    Duration::from_secs(config.copy_status_retry_delay),
                )
                .with("target_snapshot_name", &target_snapshot_name)
                .with("copy_status", &status)
                .with("copy_check_attempts", attempts))
            }
        }
    }
}
