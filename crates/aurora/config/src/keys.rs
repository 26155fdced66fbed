//! Known configuration keys and their coercion classes.

/// Keys the resolver recognizes. Environment variables map onto these by
/// upper-casing (`SOURCE_REGION` → `source_region`). Unknown keys from any
/// source are ignored.
pub const KNOWN_KEYS: &[&str] = &[
    "source_region",
    "target_region",
    "source_cluster_id",
    "target_cluster_id",
    "snapshot_prefix",
    "vpc_security_group_ids",
    "db_subnet_group_name",
    "availability_zones",
    "db_cluster_parameter_group_name",
    "kms_key_id",
    "master_credentials_secret_id",
    "app_credentials_secret_id",
    "copy_status_retry_delay",
    "restore_status_retry_delay",
    "delete_status_retry_delay",
    "max_copy_attempts",
    "copy_check_interval",
    "max_restore_attempts",
    "restore_check_interval",
    "skip_final_snapshot",
    "deletion_protection",
    "archive_snapshot",
    "enable_iam_database_authentication",
    "storage_encrypted",
    "port",
    "backup_retention_period",
    "db_connection_timeout",
    "sns_topic_arn",
    "state_table_name",
    "audit_table_name",
    "environment",
    "log_level",
    "log_bucket",
    "log_prefix",
    "cleanup_snapshot",
    "cleanup_state_data",
    "cleanup_logs",
    "parameter_prefix",
];

/// Keys coerced to integers (base-10) when they arrive as strings.
pub const INT_KEYS: &[&str] = &[
    "copy_status_retry_delay",
    "restore_status_retry_delay",
    "delete_status_retry_delay",
    "max_copy_attempts",
    "copy_check_interval",
    "max_restore_attempts",
    "restore_check_interval",
    "port",
    "backup_retention_period",
    "db_connection_timeout",
];

/// Keys coerced to booleans when they arrive as strings. The recognized
/// true spellings are `true`, `1`, `yes`, `y` (case-insensitive); anything
/// else reads as false.
pub const BOOL_KEYS: &[&str] = &[
    "skip_final_snapshot",
    "deletion_protection",
    "archive_snapshot",
    "enable_iam_database_authentication",
    "storage_encrypted",
    "cleanup_snapshot",
    "cleanup_state_data",
    "cleanup_logs",
];
