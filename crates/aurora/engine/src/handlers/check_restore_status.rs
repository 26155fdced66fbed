//! Poll the cluster restore until the cluster is available.

use std::time::Duration;

use async_trait::async_trait;

use aurora_types::StepName;

use crate::poll::{classify, MissingPolicy, PollSpec, PollVerdict};
use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

const SPEC: PollSpec = PollSpec {
    advance_on: &["available"],
    fail_on: &["failed", "incompatible-restore"],
    missing: MissingPolicy::Wait,
};

/// Polling state machine over the restored cluster's status. On
/// availability the connection facts (endpoint, port, engine, network
/// placement) are persisted for the database steps.
pub struct CheckRestoreStatusHandler;

#[async_trait]
impl StepHandler for CheckRestoreStatusHandler {
    fn step(&self) -> StepName {
        StepName::CheckRestoreStatus
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;
        let attempts = ctx.carried_i64("restore_check_attempts").unwrap_or(0) + 1;

        let cluster = services
            .clusters
            .find_cluster(&config.target_region, &config.target_cluster_id)
            .await?;

        match classify(cluster.as_ref().map(|c| c.status.as_str()), &SPEC) {
            PollVerdict::Advance => {
                let cluster = cluster.expect("available cluster was described");
                Ok(StepOutcome::advance(
                    format!("Cluster {} is available", config.target_cluster_id),
                    StepName::SetupDbUsers,
                )
                .with("restore_status", "available")
                .with("cluster_endpoint", cluster.endpoint)
                .with("cluster_port", cluster.port)
                .with("engine", cluster.engine)
                .with("engine_version", cluster.engine_version)
                .with("db_subnet_group", cluster.db_subnet_group)
                .with("vpc_security_group_ids", cluster.vpc_security_group_ids))
            }
            PollVerdict::Fail(status) => Err(StepError::StepFailed(format!(
                "Cluster restore failed with status: {status}"
            ))),
            PollVerdict::Wait(status) => {
                if attempts >= i64::from(config.max_restore_attempts) {
                    return Err(StepError::StepFailed(format!(
                        "Cluster {} not available after {attempts} checks",
                        config.target_cluster_id
                    )));
                }
                Ok(StepOutcome::waiting(
                    format!("Cluster {} is {}", config.target_cluster_id, status),
                    Duration::from_secs(config.restore_check_interval),
                )
                .with("restore_status", &status)
                .with("restore_check_attempts", attempts))
            }
        }
    }
}
