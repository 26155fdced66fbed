//! Uniform classification of SDK errors.

use aws_sdk_rds::error::{ProvideErrorMetadata, SdkError};

use aurora_engine::ports::{CloudError, CloudErrorKind};

/// Map an SDK failure onto the engine's error model. Transport-level
/// timeouts and dispatch failures are transient; service errors classify by
/// their error code.
pub(crate) fn classify_error<E>(operation: &str, err: SdkError<E>) -> CloudError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    let transport_failure = matches!(
        err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)
    );
    let code = err.code().unwrap_or_default().to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{err:?}"));
    let kind = if transport_failure {
        CloudErrorKind::Timeout
    } else {
        kind_for_code(&code)
    };
    CloudError::new(kind, format!("{operation}: {message}"))
}

/// Classification by service error code.
pub(crate) fn kind_for_code(code: &str) -> CloudErrorKind {
    match code {
        "Throttling" | "ThrottlingException" | "RequestLimitExceeded"
        | "TooManyRequestsException" | "SlowDown" => CloudErrorKind::Throttled,
        "RequestTimeout" | "RequestTimeoutException" => CloudErrorKind::Timeout,
        "ServiceUnavailable" | "InternalError" | "InternalFailure" | "ServiceFailure" => {
            CloudErrorKind::ServiceUnavailable
        }
        "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation" => {
            CloudErrorKind::AccessDenied
        }
        _ if code.contains("NotFound") => CloudErrorKind::NotFound,
        _ if code.contains("AlreadyExists") => CloudErrorKind::AlreadyExists,
        _ if code.contains("InvalidParameter") || code.contains("Validation") => {
            CloudErrorKind::InvalidParameter
        }
        _ if code.contains("Invalid") && code.contains("State") => CloudErrorKind::InvalidState,
        _ => CloudErrorKind::Other,
    }
}
