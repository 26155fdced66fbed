//! Administrative cleanup, invoked out-of-band by an operator.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use aurora_types::StepName;

use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Removes what an operation left behind: the restored snapshot copy, the
/// state rows, and log objects under the operation's prefix. Each
/// sub-operation is independently best-effort; partial success is reported
/// per sub-operation. Never part of the chain and never dispatches.
pub struct CleanupHandler;

#[async_trait]
impl StepHandler for CleanupHandler {
    fn step(&self) -> StepName {
        StepName::Cleanup
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;
        let state = ctx
            .prior
            .as_ref()
            .ok_or_else(|| {
                StepError::Validation(format!(
                    "no state found for operation {}",
                    ctx.operation_id
                ))
            })?
            .clone();

        let mut results = Map::new();

        if config.cleanup_snapshot {
            let deleted = match state.str_field("target_snapshot_name") {
                // Same-region operations never produced a copy; the carried
                // name is the daily snapshot itself and must survive.
                Some(_) if config.same_region() => false,
                Some(snapshot_id) => {
                    match services
                        .snapshots
                        .delete_snapshot(&config.target_region, snapshot_id)
                        .await
                    {
                        Ok(deleted) => deleted,
                        Err(err) => {
                            warn!(
                                operation_id = %ctx.operation_id,
                                snapshot_id,
                                error = %err,
                                "snapshot cleanup failed"
                            );
                            false
                        }
                    }
                }
                None => false,
            };
            results.insert("snapshot_deleted".into(), Value::Bool(deleted));
        }

        if config.cleanup_logs {
            let deleted = match (&config.log_bucket, &services.logs) {
                (Some(bucket), Some(logs)) => {
                    let prefix = format!("{}/{}/", config.log_prefix, ctx.operation_id);
                    match logs.delete_prefix(bucket, &prefix).await {
                        Ok(count) => {
                            results.insert("log_objects_deleted".into(), Value::from(count));
                            true
                        }
                        Err(err) => {
                            warn!(
                                operation_id = %ctx.operation_id,
                                bucket = %bucket,
                                error = %err,
                                "log cleanup failed"
                            );
                            false
                        }
                    }
                }
                _ => {
                    warn!(
                        operation_id = %ctx.operation_id,
                        "no log bucket configured, skipping log cleanup"
                    );
                    false
                }
            };
            results.insert("logs_deleted".into(), Value::Bool(deleted));
        }

        // Last, because it removes the rows this handler just read.
        if config.cleanup_state_data {
            match services.state.delete(&ctx.operation_id).await {
                Ok(count) => {
                    results.insert("state_rows_deleted".into(), Value::from(count));
                }
                Err(err) => {
                    warn!(
                        operation_id = %ctx.operation_id,
                        error = %err,
                        "state cleanup failed"
                    );
                    results.insert("state_rows_deleted".into(), Value::from(0));
                }
            }
        }

        info!(operation_id = %ctx.operation_id, "cleanup completed");
        Ok(StepOutcome::terminal(format!(
            "Cleanup completed for operation {}",
            ctx.operation_id
        ))
        .with("cleanup_results", Value::Object(results))
        .without_record())
    }
}
