//! Layered configuration resolution.
//!
//! Values are merged from five sources in increasing priority: built-in
//! defaults, the parameter store (`/{prefix}/{environment}/config`, a JSON
//! document), process environment variables, the latest persisted step
//! record, and finally the event payload. The resolver records where each
//! value came from for diagnostics, coerces typed keys at insertion time,
//! and validates the per-step required-key matrix before any side effect.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
mod keys;
mod resolver;
mod settings;
mod source;

pub use error::ConfigError;
pub use keys::{BOOL_KEYS, INT_KEYS, KNOWN_KEYS};
pub use resolver::{ConfigResolver, ParameterSource};
pub use settings::RestoreConfig;
pub use source::ConfigSource;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
