//! Entry step: locate the dated source snapshot.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use tracing::info;

use aurora_types::validate::{parse_snapshot_date, validate_snapshot_id};
use aurora_types::StepName;

use crate::ports::SnapshotScope;
use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Checks that the daily snapshot exists in the source region, searching
/// shared, then manual, then automated snapshots.
pub struct SnapshotCheckHandler;

/// Snapshot names follow `{prefix}-{source_cluster_id}-{date}`.
pub fn snapshot_name(prefix: &str, source_cluster_id: &str, date: NaiveDate) -> String {
    format!("{}-{}-{}", prefix, source_cluster_id, date.format("%Y-%m-%d"))
}

#[async_trait]
impl StepHandler for SnapshotCheckHandler {
    fn step(&self) -> StepName {
        StepName::SnapshotCheck
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;
        let date = match &ctx.event.date {
            Some(raw) => {
                parse_snapshot_date(raw).map_err(|err| StepError::Validation(err.to_string()))?
            }
            None => services
                .clock
                .now()
                .date_naive()
                .checked_sub_days(Days::new(1))
                .expect("date arithmetic"),
        };

        let name = snapshot_name(&config.snapshot_prefix, &config.source_cluster_id, date);
        validate_snapshot_id(&name).map_err(|err| StepError::Validation(err.to_string()))?;

        for scope in SnapshotScope::SEARCH_ORDER {
            let found = services
                .snapshots
                .find_snapshot(&config.source_region, &name, scope)
                .await?;
            if let Some(snapshot) = found {
                info!(
                    operation_id = %ctx.operation_id,
                    snapshot_name = %name,
                    scope = %scope,
                    status = %snapshot.status,
                    "source snapshot located"
                );
                return Ok(StepOutcome::advance(
                    format!("Snapshot {name} found"),
                    StepName::CopySnapshot,
                )
                .with("snapshot_name", &snapshot.identifier)
                .with("snapshot_arn", &snapshot.arn)
                .with("snapshot_status", &snapshot.status)
                .with("snapshot_scope", scope.as_str())
                .with("snapshot_date", date.format("%Y-%m-%d").to_string())
                .with("encrypted", snapshot.encrypted)
                .with("size", snapshot.allocated_storage)
                .with("created", snapshot.created_at.map(|t| t.to_rfc3339()))
                .with("source_region", &config.source_region)
                .with("target_region", &config.target_region)
                .with("source_cluster_id", &config.source_cluster_id)
                .with("target_cluster_id", &config.target_cluster_id));
            }
        }

        Err(StepError::NotFound(format!("Snapshot {name} not found")))
    }
}
