//! Typed view of the resolved configuration.

use serde_json::Value;

use crate::ConfigResolver;

/// Fully resolved configuration, typed for consumption by the engine and
/// the adapters. Optional fields are `None` when the underlying key is
/// empty or absent.
#[derive(Debug, Clone)]
pub struct RestoreConfig {
    pub environment: String,
    pub log_level: String,

    pub source_region: String,
    pub target_region: String,
    pub source_cluster_id: String,
    pub target_cluster_id: String,
    pub snapshot_prefix: String,

    pub kms_key_id: Option<String>,
    pub db_subnet_group_name: Option<String>,
    pub vpc_security_group_ids: Vec<String>,
    pub availability_zones: Vec<String>,
    pub db_cluster_parameter_group_name: Option<String>,
    pub backup_retention_period: Option<i32>,
    pub enable_iam_database_authentication: Option<bool>,
    pub storage_encrypted: Option<bool>,
    pub port: u16,
    pub deletion_protection: bool,
    pub skip_final_snapshot: bool,

    pub master_credentials_secret_id: String,
    pub app_credentials_secret_id: String,
    pub db_connection_timeout: u64,

    pub copy_status_retry_delay: u64,
    pub restore_status_retry_delay: u64,
    pub delete_status_retry_delay: u64,
    pub max_copy_attempts: u32,
    pub copy_check_interval: u64,
    pub max_restore_attempts: u32,
    pub restore_check_interval: u64,

    pub archive_snapshot: bool,
    pub sns_topic_arn: Option<String>,

    pub state_table_name: String,
    pub audit_table_name: String,

    pub log_bucket: Option<String>,
    pub log_prefix: String,
    pub cleanup_snapshot: bool,
    pub cleanup_state_data: bool,
    pub cleanup_logs: bool,
    pub parameter_prefix: String,
}

impl RestoreConfig {
    /// Extract the typed view from a resolver. Intended to run after
    /// [`ConfigResolver::validate_for`]; out-of-range numerics fall back to
    /// their defaults rather than panicking.
    pub fn from_resolver(resolver: &ConfigResolver) -> Self {
        Self {
            environment: string(resolver, "environment"),
            log_level: string(resolver, "log_level"),
            source_region: string(resolver, "source_region"),
            target_region: string(resolver, "target_region"),
            source_cluster_id: string(resolver, "source_cluster_id"),
            target_cluster_id: string(resolver, "target_cluster_id"),
            snapshot_prefix: string(resolver, "snapshot_prefix"),
            kms_key_id: optional(resolver, "kms_key_id"),
            db_subnet_group_name: optional(resolver, "db_subnet_group_name"),
            vpc_security_group_ids: csv(resolver, "vpc_security_group_ids"),
            availability_zones: csv(resolver, "availability_zones"),
            db_cluster_parameter_group_name: optional(resolver, "db_cluster_parameter_group_name"),
            backup_retention_period: resolver
                .get("backup_retention_period")
                .and_then(Value::as_i64)
                .map(|n| n as i32),
            enable_iam_database_authentication: resolver
                .get("enable_iam_database_authentication")
                .and_then(Value::as_bool),
            storage_encrypted: resolver.get("storage_encrypted").and_then(Value::as_bool),
            port: int(resolver, "port", 5432) as u16,
            deletion_protection: boolean(resolver, "deletion_protection", false),
            skip_final_snapshot: boolean(resolver, "skip_final_snapshot", true),
            master_credentials_secret_id: string(resolver, "master_credentials_secret_id"),
            app_credentials_secret_id: string(resolver, "app_credentials_secret_id"),
            db_connection_timeout: int(resolver, "db_connection_timeout", 30) as u64,
            copy_status_retry_delay: int(resolver, "copy_status_retry_delay", 60) as u64,
            restore_status_retry_delay: int(resolver, "restore_status_retry_delay", 60) as u64,
            delete_status_retry_delay: int(resolver, "delete_status_retry_delay", 60) as u64,
            max_copy_attempts: int(resolver, "max_copy_attempts", 60) as u32,
            copy_check_interval: int(resolver, "copy_check_interval", 30) as u64,
            max_restore_attempts: int(resolver, "max_restore_attempts", 60) as u32,
            restore_check_interval: int(resolver, "restore_check_interval", 30) as u64,
            archive_snapshot: boolean(resolver, "archive_snapshot", true),
            sns_topic_arn: optional(resolver, "sns_topic_arn"),
            state_table_name: string(resolver, "state_table_name"),
            audit_table_name: string(resolver, "audit_table_name"),
            log_bucket: optional(resolver, "log_bucket"),
            log_prefix: string(resolver, "log_prefix"),
            cleanup_snapshot: boolean(resolver, "cleanup_snapshot", true),
            cleanup_state_data: boolean(resolver, "cleanup_state_data", true),
            cleanup_logs: boolean(resolver, "cleanup_logs", true),
            parameter_prefix: string(resolver, "parameter_prefix"),
        }
    }

    /// Whether source and target live in the same region, in which case the
    /// copy phase short-circuits.
    pub fn same_region(&self) -> bool {
        self.source_region == self.target_region
    }
}

fn string(resolver: &ConfigResolver, key: &str) -> String {
    resolver.str_value(key).to_string()
}

fn optional(resolver: &ConfigResolver, key: &str) -> Option<String> {
    let value = resolver.str_value(key).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn csv(resolver: &ConfigResolver, key: &str) -> Vec<String> {
    resolver
        .str_value(key)
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn int(resolver: &ConfigResolver, key: &str, default: i64) -> i64 {
    resolver.get(key).and_then(Value::as_i64).unwrap_or(default)
}

fn boolean(resolver: &ConfigResolver, key: &str, default: bool) -> bool {
    resolver.get(key).and_then(Value::as_bool).unwrap_or(default)
}
