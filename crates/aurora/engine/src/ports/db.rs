//! Database administration port.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::{CloudError, CloudErrorKind};

/// Errors raised by the database administration adapter.
#[derive(Debug, Error)]
pub enum DbAdminError {
    /// The session could not be opened.
    #[error("database connection failed: {0}")]
    Connect(String),

    /// A statement failed; the enclosing transaction is rolled back.
    #[error("sql error: {0}")]
    Sql(String),
}

/// Connection parameters for an administrative database session.
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub connect_timeout: Duration,
}

/// Master credentials as stored in the secret store.
#[derive(Debug, Clone)]
pub struct MasterCredentials {
    pub database: String,
    pub username: String,
    pub password: String,
}

impl MasterCredentials {
    /// Parse from the secret's JSON document, reporting missing fields.
    pub fn from_json(value: &Value) -> Result<Self, CloudError> {
        Ok(Self {
            database: required(value, "database")?,
            username: required(value, "username")?,
            password: required(value, "password")?,
        })
    }
}

/// Application and read-only credentials as stored in the secret store.
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub app_username: String,
    pub app_password: String,
    pub readonly_username: String,
    pub readonly_password: String,
}

impl AppCredentials {
    /// Parse from the secret's JSON document, reporting missing fields.
    pub fn from_json(value: &Value) -> Result<Self, CloudError> {
        Ok(Self {
            app_username: required(value, "app_username")?,
            app_password: required(value, "app_password")?,
            readonly_username: required(value, "readonly_username")?,
            readonly_password: required(value, "readonly_password")?,
        })
    }
}

fn required(value: &Value, field: &str) -> Result<String, CloudError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            CloudError::new(
                CloudErrorKind::InvalidParameter,
                format!("secret is missing field: {field}"),
            )
        })
}

/// Privilege profile granted to a provisioned role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAccess {
    /// SELECT/INSERT/UPDATE/DELETE on tables, USAGE/SELECT on sequences.
    ReadWrite,
    /// SELECT on tables, USAGE/SELECT on sequences.
    ReadOnly,
}

/// A role to provision on the restored cluster.
#[derive(Debug, Clone)]
pub struct RoleSpec {
    pub name: String,
    pub password: String,
    pub access: RoleAccess,
}

/// Result of the restore verification probes.
#[derive(Debug, Clone)]
pub struct VerificationSummary {
    pub server_version: String,
    pub schemas: Vec<String>,
    pub table_count: usize,
}

/// Administrative SQL against the restored cluster.
#[async_trait]
pub trait DatabaseAdmin: Send + Sync {
    /// Idempotently provision the given roles in a single transaction:
    /// create or reset each role, grant connect/usage, table and sequence
    /// privileges per its access profile, and matching default privileges
    /// for future objects.
    async fn provision_roles(
        &self,
        target: &ConnectTarget,
        roles: &[RoleSpec],
    ) -> Result<(), DbAdminError>;

    /// Run the verification probes: a version query, then user schema and
    /// table enumeration (system schemas excluded).
    async fn verify(&self, target: &ConnectTarget) -> Result<VerificationSummary, DbAdminError>;
}
