//! Error types for the observability sinks.

use thiserror::Error;

/// Errors raised by audit or metric sinks.
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// The backing sink rejected or failed the write.
    #[error("sink error: {0}")]
    Sink(String),

    /// An event could not be converted to its stored shape.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, ObservabilityError>;
