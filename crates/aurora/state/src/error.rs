//! Error types for the state store.

use thiserror::Error;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// A record could not be converted to or from its stored shape.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
