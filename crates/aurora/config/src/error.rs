//! Error types for configuration resolution.

use aurora_types::StepName;
use thiserror::Error;

/// Errors raised while resolving or validating configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A required key is missing or empty for the running step.
    #[error("missing required config key for {step}: {key}")]
    MissingRequired { step: StepName, key: &'static str },

    /// A present value fails format validation.
    #[error("invalid value for {key}: {value} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// The parameter store could not be read.
    #[error("parameter store error: {0}")]
    ParameterStore(String),
}
