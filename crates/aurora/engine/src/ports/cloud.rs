//! Cloud adapter ports and their shared error model.
//!
//! Expected conditions (an absent snapshot during a lookup, an
//! already-existing cluster during restore) are represented as results
//! where the consuming handler treats them as outcomes; errors carry a
//! classification so the engine can map them onto response codes uniformly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Classification of a cloud adapter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudErrorKind {
    /// The referenced resource does not exist.
    NotFound,
    /// The resource already exists.
    AlreadyExists,
    /// The resource exists but is in a state that rejects the operation.
    InvalidState,
    /// The service throttled the request.
    Throttled,
    /// The request timed out.
    Timeout,
    /// The service reported a transient availability problem.
    ServiceUnavailable,
    /// The caller is not authorized.
    AccessDenied,
    /// The request was malformed.
    InvalidParameter,
    /// Anything else.
    Other,
}

impl fmt::Display for CloudErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CloudErrorKind::NotFound => "not found",
            CloudErrorKind::AlreadyExists => "already exists",
            CloudErrorKind::InvalidState => "invalid state",
            CloudErrorKind::Throttled => "throttled",
            CloudErrorKind::Timeout => "timeout",
            CloudErrorKind::ServiceUnavailable => "service unavailable",
            CloudErrorKind::AccessDenied => "access denied",
            CloudErrorKind::InvalidParameter => "invalid parameter",
            CloudErrorKind::Other => "cloud error",
        };
        f.write_str(name)
    }
}

/// A classified cloud adapter failure.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct CloudError {
    pub kind: CloudErrorKind,
    pub message: String,
}

impl CloudError {
    pub fn new(kind: CloudErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(CloudErrorKind::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(CloudErrorKind::AlreadyExists, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(CloudErrorKind::Other, message)
    }

    /// Whether retrying the call may succeed (throttling, timeouts,
    /// service unavailability).
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            CloudErrorKind::Throttled | CloudErrorKind::Timeout | CloudErrorKind::ServiceUnavailable
        )
    }
}

/// Visibility class of a cluster snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotScope {
    Shared,
    Manual,
    Automated,
}

impl SnapshotScope {
    /// Lookup order used by the entry step.
    pub const SEARCH_ORDER: [SnapshotScope; 3] = [
        SnapshotScope::Shared,
        SnapshotScope::Manual,
        SnapshotScope::Automated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotScope::Shared => "shared",
            SnapshotScope::Manual => "manual",
            SnapshotScope::Automated => "automated",
        }
    }
}

impl fmt::Display for SnapshotScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of a cluster snapshot as reported by the cloud service.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub identifier: String,
    pub arn: String,
    pub status: String,
    pub cluster_id: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub encrypted: bool,
    pub kms_key_id: Option<String>,
    pub allocated_storage: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Description of a database cluster as reported by the cloud service.
#[derive(Debug, Clone)]
pub struct ClusterInfo {
    pub identifier: String,
    pub status: String,
    pub endpoint: Option<String>,
    pub port: Option<i32>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub db_subnet_group: Option<String>,
    pub vpc_security_group_ids: Vec<String>,
}

/// Parameters for a cross-region snapshot copy.
#[derive(Debug, Clone)]
pub struct CopySnapshotRequest {
    pub source_snapshot_arn: String,
    pub target_snapshot_id: String,
    pub source_region: String,
    pub kms_key_id: Option<String>,
    pub copy_tags: bool,
}

/// Parameters for restoring a cluster from a snapshot. Optional fields are
/// applied only when present in configuration.
#[derive(Debug, Clone)]
pub struct RestoreSpec {
    pub cluster_id: String,
    pub snapshot_id: String,
    pub engine: String,
    pub engine_version: Option<String>,
    pub port: Option<i32>,
    pub db_subnet_group_name: Option<String>,
    pub vpc_security_group_ids: Vec<String>,
    pub availability_zones: Vec<String>,
    pub enable_iam_database_authentication: Option<bool>,
    pub storage_encrypted: Option<bool>,
    pub kms_key_id: Option<String>,
    pub deletion_protection: Option<bool>,
    pub backup_retention_period: Option<i32>,
    pub db_cluster_parameter_group_name: Option<String>,
    pub tags: Vec<(String, String)>,
}

/// Snapshot lookup, copy, and deletion.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Look up a snapshot by identifier within one scope. `Ok(None)` means
    /// it does not exist.
    async fn find_snapshot(
        &self,
        region: &str,
        snapshot_id: &str,
        scope: SnapshotScope,
    ) -> Result<Option<SnapshotInfo>, CloudError>;

    /// Start a snapshot copy and return the new snapshot's description.
    async fn copy_snapshot(
        &self,
        region: &str,
        request: &CopySnapshotRequest,
    ) -> Result<SnapshotInfo, CloudError>;

    /// Delete a snapshot. Returns `false` when it was already gone.
    async fn delete_snapshot(&self, region: &str, snapshot_id: &str) -> Result<bool, CloudError>;
}

/// Cluster lookup, deletion, and restore.
#[async_trait]
pub trait ClusterControl: Send + Sync {
    /// Describe a cluster by identifier. `Ok(None)` means it does not exist.
    async fn find_cluster(
        &self,
        region: &str,
        cluster_id: &str,
    ) -> Result<Option<ClusterInfo>, CloudError>;

    /// Start deleting a cluster.
    async fn delete_cluster(
        &self,
        region: &str,
        cluster_id: &str,
        skip_final_snapshot: bool,
    ) -> Result<(), CloudError>;

    /// Start restoring a cluster from a snapshot and return its initial
    /// description.
    async fn restore_cluster(
        &self,
        region: &str,
        spec: &RestoreSpec,
    ) -> Result<ClusterInfo, CloudError>;
}

/// Credential retrieval from the secret store.
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    async fn master_credentials(
        &self,
        region: &str,
        secret_id: &str,
    ) -> Result<super::MasterCredentials, CloudError>;

    async fn app_credentials(
        &self,
        region: &str,
        secret_id: &str,
    ) -> Result<super::AppCredentials, CloudError>;
}

/// Operator notification publishing.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish a message and return the transport's message id.
    async fn publish(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
    ) -> Result<String, CloudError>;
}

/// Log object removal used by administrative cleanup.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Delete every object under a prefix; returns the number removed.
    async fn delete_prefix(&self, bucket: &str, prefix: &str) -> Result<u64, CloudError>;
}
