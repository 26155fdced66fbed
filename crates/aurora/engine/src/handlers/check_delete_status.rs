//! Poll the cluster deletion until the cluster is gone.

use std::time::Duration;

use async_trait::async_trait;

use aurora_types::StepName;

use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Polling state machine over cluster deletion: not-found is the goal,
/// anything else re-polls. Deletion always converges, so this poller is
/// unbounded like the original.
pub struct CheckDeleteStatusHandler;

#[async_trait]
impl StepHandler for CheckDeleteStatusHandler {
    fn step(&self) -> StepName {
        StepName::CheckDeleteStatus
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

        match cluster {
            None => Ok(StepOutcome::advance(
                format!("Cluster {} has been deleted", config.target_cluster_id),
                StepName::RestoreSnapshot,
            )
            .with("delete_status", "deleted")),
            Some(cluster) => Ok(StepOutcome::waiting(
                format!(
                    "Cluster {} is still {}",
                    config.target_cluster_id, cluster.status
                ),
                Duration::from_secs(config.delete_status_retry_delay),
            )
            .with("delete_status", &cluster.status)),
        }
    }
}
