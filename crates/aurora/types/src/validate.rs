//! Input validation for identifiers carried in events and configuration.
//!
//! Formats follow the cloud service's rules: cluster/snapshot identifiers
//! start alphanumeric and contain only alphanumerics and hyphens, regions
//! look like `us-east-1`, VPC resources carry their well-known prefixes.

use chrono::NaiveDate;
use thiserror::Error;

/// Validation failures for pipeline inputs.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("invalid cluster id: {0}")]
    InvalidClusterId(String),

    #[error("invalid snapshot id: {0}")]
    InvalidSnapshotId(String),

    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("invalid {kind} id: {value}")]
    InvalidVpcResource { kind: &'static str, value: String },
}

fn is_identifier(value: &str, max_len: usize) -> bool {
    if value.is_empty() || value.len() > max_len {
        return false;
    }
    let mut chars = value.chars();
    let first = chars.next().expect("non-empty");
    first.is_ascii_alphanumeric()
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validate a region string (`xx-yyyy-N`).
pub fn validate_region(region: &str) -> Result<(), ValidationError> {
    let err = || ValidationError::InvalidRegion(region.to_string());
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() != 3 {
        return Err(err());
    }
    let [prefix, name, digit] = [parts[0], parts[1], parts[2]];
    let ok = prefix.len() == 2
        && prefix.chars().all(|c| c.is_ascii_lowercase())
        && !name.is_empty()
        && name.chars().all(|c| c.is_ascii_lowercase())
        && digit.len() == 1
        && digit.chars().all(|c| c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(err())
    }
}

/// Validate a cluster identifier (≤ 63 chars).
pub fn validate_cluster_id(cluster_id: &str) -> Result<(), ValidationError> {
    if is_identifier(cluster_id, 63) {
        Ok(())
    } else {
        Err(ValidationError::InvalidClusterId(cluster_id.to_string()))
    }
}

/// Validate a snapshot identifier (≤ 255 chars).
pub fn validate_snapshot_id(snapshot_id: &str) -> Result<(), ValidationError> {
    if is_identifier(snapshot_id, 255) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSnapshotId(snapshot_id.to_string()))
    }
}

fn validate_prefixed_hex(
    value: &str,
    prefix: &'static str,
    kind: &'static str,
) -> Result<(), ValidationError> {
    let ok = value
        .strip_prefix(prefix)
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()))
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidVpcResource {
            kind,
            value: value.to_string(),
        })
    }
}

pub fn validate_vpc_id(value: &str) -> Result<(), ValidationError> {
    validate_prefixed_hex(value, "vpc-", "vpc")
}

pub fn validate_subnet_id(value: &str) -> Result<(), ValidationError> {
    validate_prefixed_hex(value, "subnet-", "subnet")
}

pub fn validate_security_group_id(value: &str) -> Result<(), ValidationError> {
    validate_prefixed_hex(value, "sg-", "security group")
}

/// Parse a snapshot date in `YYYY-MM-DD` form.
pub fn parse_snapshot_date(date: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))
}
