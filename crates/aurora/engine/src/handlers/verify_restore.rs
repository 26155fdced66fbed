//! Verify connectivity and schema presence on the restored cluster.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use aurora_types::StepName;

use crate::ports::ConnectTarget;
use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Opens a session against the restored cluster, probes the server version,
/// and enumerates user schemas and tables.
pub struct VerifyRestoreHandler;

#[async_trait]
impl StepHandler for VerifyRestoreHandler {
    fn step(&self) -> StepName {
        StepName::VerifyRestore
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;

        // Connection facts come from the restore poller's record; fall back
        // to a live describe when replayed without them.
        let (endpoint, port) = match (ctx.carried_str("cluster_endpoint"), ctx.carried_i64("cluster_port")) {
            (Some(endpoint), Some(port)) if !endpoint.is_empty() => {
                (endpoint.to_string(), u16::try_from(port).unwrap_or(config.port))
            }
            _ => {
                let cluster = services
                    .clusters
                    .find_cluster(&config.target_region, &config.target_cluster_id)
                    .await?
                    .ok_or_else(|| {
                        StepError::NotFound(format!(
                            "Cluster {} not found",
                            config.target_cluster_id
                        ))
                    })?;
                let endpoint = cluster.endpoint.ok_or_else(|| {
                    StepError::StepFailed(format!(
                        "Cluster {} has no endpoint",
                        config.target_cluster_id
                    ))
                })?;
                let port = cluster
                    .port
                    .and_then(|p| u16::try_from(p).ok())
                    .unwrap_or(config.port);
                (endpoint, port)
            }
        };

        let master = services
            .secrets
            .master_credentials(&config.target_region, &config.master_credentials_secret_id)
            .await?;
        let target = ConnectTarget {
            host: endpoint.clone(),
            port,
            database: master.database.clone(),
            username: master.username.clone(),
            password: master.password.clone(),
            connect_timeout: Duration::from_secs(config.db_connection_timeout),
        };

        let summary = services.database.verify(&target).await?;
        info!(
            operation_id = %ctx.operation_id,
            server_version = %summary.server_version,
            schema_count = summary.schemas.len(),
            table_count = summary.table_count,
            "restore verified"
        );

        Ok(StepOutcome::advance(
            format!("Cluster {} verified", config.target_cluster_id),
            StepName::ArchiveSnapshot,
        )
        .with("verification_status", "completed")
        .with("server_version", &summary.server_version)
        .with("schema_count", summary.schemas.len())
        .with("table_count", summary.table_count)
        .with("schemas", &summary.schemas)
        .with("cluster_endpoint", &endpoint)
        .with("cluster_port", port))
    }
}
