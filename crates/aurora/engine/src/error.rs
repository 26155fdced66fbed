//! Engine error classification.

use thiserror::Error;

use aurora_config::ConfigError;
use aurora_state::StateError;

use crate::ports::{CloudError, CloudErrorKind, DbAdminError};

/// A classified step failure. The variant determines the response status
/// code and whether a failure record is persisted; the chain never
/// dispatches a successor on any of these.
#[derive(Debug, Error)]
pub enum StepError {
    /// Missing or invalid input. 400.
    #[error("{0}")]
    Validation(String),

    /// The operation's latest record is a failure from another step. 400,
    /// no state write (writing one would block replay of the failed step).
    #[error("{message}")]
    PreconditionFailed {
        message: String,
        previous: Option<Box<aurora_types::StepRecord>>,
    },

    /// Missing or invalid configuration. 400.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An expected artifact is absent in a terminal sense. 404.
    #[error("{0}")]
    NotFound(String),

    /// The step observed a terminal failure condition. 500.
    #[error("{0}")]
    StepFailed(String),

    /// A cloud adapter call failed after retries. Code depends on the
    /// classification.
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// Role setup or verification SQL failed. 500.
    #[error(transparent)]
    Sql(#[from] DbAdminError),

    /// The state store failed. 500.
    #[error(transparent)]
    State(#[from] StateError),
}

impl StepError {
    /// Response status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            StepError::Validation(_) | StepError::PreconditionFailed { .. } | StepError::Config(_) => {
                400
            }
            StepError::NotFound(_) => 404,
            StepError::Cloud(err) => match err.kind {
                CloudErrorKind::NotFound => 404,
                CloudErrorKind::InvalidParameter => 400,
                _ => 500,
            },
            StepError::StepFailed(_) | StepError::Sql(_) | StepError::State(_) => 500,
        }
    }
}
