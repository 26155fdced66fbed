//! Provision application roles on the restored cluster.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use aurora_types::StepName;

use crate::ports::{ConnectTarget, RoleAccess, RoleSpec};
use crate::{EngineServices, StepContext, StepError, StepHandler, StepOutcome};

/// Fetches master and application credentials and provisions the app and
/// read-only roles in one transaction. Role creation is conditional with a
/// password reset, so duplicate deliveries converge to the same grants.
pub struct SetupDbUsersHandler;

#[async_trait]
impl StepHandler for SetupDbUsersHandler {
    fn step(&self) -> StepName {
        StepName::SetupDbUsers
    }

    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError> {
        let config = &ctx.config;
        let endpoint = ctx.require_carried("cluster_endpoint")?;
        let port = ctx
            .carried_i64("cluster_port")
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or(config.port);

        let master = services
            .secrets
            .master_credentials(&config.target_region, &config.master_credentials_secret_id)
            .await?;
        let app = services
            .secrets
            .app_credentials(&config.target_region, &config.app_credentials_secret_id)
            .await?;

        let target = ConnectTarget {
            host: endpoint.clone(),
            port,
            database: master.database.clone(),
            username: master.username.clone(),
            password: master.password.clone(),
            connect_timeout: Duration::from_secs(config.db_connection_timeout),
        };
        let roles = [
            RoleSpec {
                name: app.app_username.clone(),
                password: app.app_password.clone(),
                access: RoleAccess::ReadWrite,
            },
            RoleSpec {
                name: app.readonly_username.clone(),
                password: app.readonly_password.clone(),
                access: RoleAccess::ReadOnly,
            },
        ];

        services.database.provision_roles(&target, &roles).await?;
        info!(
            operation_id = %ctx.operation_id,
            cluster_endpoint = %endpoint,
            "database roles provisioned"
        );

        Ok(StepOutcome::advance(
            format!("Database users provisioned on {endpoint}"),
            StepName::VerifyRestore,
        )
        .with("db_users_created", vec![app.app_username, app.readonly_username])
        .with("cluster_endpoint", &endpoint)
        .with("cluster_port", port))
    }
}
