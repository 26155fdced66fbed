//! Terminal step: notify operators of completion.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use aurora_types::StepName;

use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Publishes the completion message to the configured topic. Terminal: no
/// successor is dispatched.
pub struct SnsNotificationHandler;

#[async_trait]
impl StepHandler for SnsNotificationHandler {
    fn step(&self) -> StepName {
        StepName::SnsNotification
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;
        let topic_arn = config
            .sns_topic_arn
            .clone()
            .ok_or_else(|| StepError::Validation("sns_topic_arn is not configured".into()))?;

        let message = json!({
            "operation_id": ctx.operation_id,
            "status": "SUCCESS",
            "timestamp": services.clock.now().to_rfc3339(),
            "cluster_id": config.target_cluster_id,
            "region": config.target_region,
            "endpoint": ctx.carried_str("cluster_endpoint"),
            "port": ctx.carried_i64("cluster_port"),
            "target_snapshot_name": ctx.carried_str("target_snapshot_name"),
            "archive_status": ctx.carried_str("archive_status"),
        });
        let subject = format!("Aurora Restore Complete - {}", config.target_cluster_id);
        let body = serde_json::to_string_pretty(&message)
            .map_err(|err| StepError::StepFailed(format!("failed to encode message: {err}")))?;

        let message_id = services.notifier.publish(&topic_arn, &subject, &body).await?;
        info!(
            operation_id = %ctx.operation_id,
            message_id = %message_id,
            "completion notification published"
        );

        Ok(StepOutcome::terminal("Completion notification sent")
            .with("notification_status", "sent")
            .with("notification_message_id", message_id)
            .with("archive_status", ctx.carried_str("archive_status")))
    }
}
