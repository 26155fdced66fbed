//! `DatabaseAdmin` implementation over sqlx.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{debug, info};

use aurora_engine::ports::{
    ConnectTarget, DatabaseAdmin, DbAdminError, RoleAccess, RoleSpec, VerificationSummary,
};

use crate::quoting::{quote_ident, quote_literal};

/// Administrative SQL against the restored cluster. A fresh single
/// connection pool is opened per call and dropped when done; the connect
/// timeout comes from the target.
pub struct PostgresAdmin;

impl PostgresAdmin {
    pub fn new() -> Self {
        Self
    }

    async fn connect(&self, target: &ConnectTarget) -> Result<PgPool, DbAdminError> {
        let options = PgConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .database(&target.database)
            .username(&target.username)
            .password(&target.password);
        PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(target.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|err| DbAdminError::Connect(err.to_string()))
    }
}

impl Default for PostgresAdmin {
    fn default() -> Self {
        Self::new()
    }
}

/// Table privileges for an access profile.
fn table_privileges(access: RoleAccess) -> &'static str {
    match access {
        RoleAccess::ReadWrite => "SELECT, INSERT, UPDATE, DELETE",
        RoleAccess::ReadOnly => "SELECT",
    }
}

/// The grant statements applied to one role after it exists. The role
/// create/alter statement is decided separately from the `pg_roles` probe.
fn grant_statements(database: &str, role: &RoleSpec) -> Vec<String> {
    let name = quote_ident(&role.name);
    let privileges = table_privileges(role.access);
    vec![
        format!("GRANT CONNECT ON DATABASE {} TO {name}", quote_ident(database)),
        format!("GRANT USAGE ON SCHEMA public TO {name}"),
        format!("GRANT {privileges} ON ALL TABLES IN SCHEMA public TO {name}"),
        format!("GRANT USAGE, SELECT ON ALL SEQUENCES IN SCHEMA public TO {name}"),
        format!(
            "ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT {privileges} ON TABLES TO {name}"
        ),
        format!(
            "ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT USAGE, SELECT ON SEQUENCES TO {name}"
        ),
    ]
}

fn role_statement(role: &RoleSpec, exists: bool) -> String {
    let name = quote_ident(&role.name);
    let password = quote_literal(&role.password);
    if exists {
        format!("ALTER ROLE {name} WITH LOGIN PASSWORD {password}")
    } else {
        format!("CREATE ROLE {name} WITH LOGIN PASSWORD {password}")
    }
}

#[async_trait]
impl DatabaseAdmin for PostgresAdmin {
    async fn provision_roles(
        &self,
        target: &ConnectTarget,
        roles: &[RoleSpec],
    ) -> Result<(), DbAdminError> {
        let pool = self.connect(target).await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|err| DbAdminError::Sql(err.to_string()))?;

        for role in roles {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_roles WHERE rolname = $1)")
                    .bind(&role.name)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|err| DbAdminError::Sql(err.to_string()))?;
            debug!(role = %role.name, exists, "provisioning role");

            sqlx::query(&role_statement(role, exists))
                .execute(&mut *tx)
                .await
                .map_err(|err| DbAdminError::Sql(err.to_string()))?;
            for statement in grant_statements(&target.database, role) {
                sqlx::query(&statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(|err| DbAdminError::Sql(err.to_string()))?;
            }
        }

        // Dropping the transaction without commit rolls everything back, so
        // a failed statement leaves no partial grants behind.
        tx.commit()
            .await
            .map_err(|err| DbAdminError::Sql(err.to_string()))?;
        info!(host = %target.host, roles = roles.len(), "database roles provisioned");
        Ok(())
    }

    async fn verify(&self, target: &ConnectTarget) -> Result<VerificationSummary, DbAdminError> {
        let pool = self.connect(target).await?;

        let server_version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&pool)
            .await
            .map_err(|err| DbAdminError::Sql(err.to_string()))?;

        let schemas: Vec<String> = sqlx::query_scalar(
            "SELECT schema_name::text FROM information_schema.schemata \
             WHERE schema_name NOT IN ('information_schema', 'pg_catalog') \
             ORDER BY schema_name",
        )
        .fetch_all(&pool)
        .await
        .map_err(|err| DbAdminError::Sql(err.to_string()))?;

        let table_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema NOT IN ('information_schema', 'pg_catalog')",
        )
        .fetch_one(&pool)
        .await
        .map_err(|err| DbAdminError::Sql(err.to_string()))?;

        info!(
            host = %target.host,
            schema_count = schemas.len(),
            table_count,
            "restore verification probes complete"
        );
        Ok(VerificationSummary {
            server_version,
            schemas,
            table_count: table_count.max(0) as usize,
        })
    }
}
