//! Operation identifiers.
//!
//! An operation is one end-to-end restore attempt. Its id is minted by the
//! first step and carried verbatim through every subsequent step, so the
//! wrapper accepts any non-empty string on the way in and only controls the
//! format of ids it mints itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a restore operation.
///
/// Minted ids follow the format `op-<unix_seconds>-<8 hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Wrap an id carried in from an event or a persisted record.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh id for an operation starting now.
    pub fn mint(now_unix: i64) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("op-{}-{}", now_unix, &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
