//! Error types for detection calls.

use crate::breaker::{BreakerRejection, BreakerState};
use std::time::Duration;
use thiserror::Error;

/// Every terminal outcome of a failed detection call.
///
/// Nothing here is a soft failure: callers must map each variant explicitly.
/// [`DetectError::status_code`] gives the conventional HTTP mapping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    /// Caller input rejected locally; no network call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The circuit breaker refused the call before its first attempt; no
    /// network call was made.
    #[error("Inference service '{target}' unavailable (circuit {state}), retry after {}ms", .retry_after.as_millis())]
    ServiceUnavailable {
        target: String,
        state: BreakerState,
        retry_after: Duration,
    },

    /// Every attempt ended in a transport timeout (the last one did).
    #[error("Inference service timed out after {attempts} attempt(s): {message}")]
    UpstreamTimeout { attempts: u32, message: String },

    /// The service could not be reached (connection refused, reset, DNS).
    #[error("Inference service unreachable after {attempts} attempt(s): {message}")]
    UpstreamUnreachable { attempts: u32, message: String },

    /// The service answered with a non-2xx status.
    #[error("Inference service returned {status}: {body_excerpt}")]
    UpstreamError { status: u16, body_excerpt: String },

    /// The service answered 2xx with a body that breaks the response contract.
    #[error("Malformed inference response: {0}")]
    MalformedResponse(String),
}

impl DetectError {
    /// HTTP status an API layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DetectError::ServiceUnavailable { .. } => 503,
            DetectError::UpstreamTimeout { .. } => 504,
            DetectError::UpstreamError { status, .. } if (400..600).contains(status) => *status,
            DetectError::UpstreamError { .. } => 502,
            DetectError::InvalidInput(_)
            | DetectError::UpstreamUnreachable { .. }
            | DetectError::MalformedResponse(_) => 500,
        }
    }

    /// True when the breaker refused the call before any attempt was made.
    pub fn is_breaker_rejection(&self) -> bool {
        matches!(self, DetectError::ServiceUnavailable { .. })
    }

    /// Stable snake_case name for logs, metrics and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            DetectError::InvalidInput(_) => "invalid_input",
            DetectError::ServiceUnavailable { .. } => "service_unavailable",
            DetectError::UpstreamTimeout { .. } => "upstream_timeout",
            DetectError::UpstreamUnreachable { .. } => "upstream_unreachable",
            DetectError::UpstreamError { .. } => "upstream_error",
            DetectError::MalformedResponse(_) => "malformed_response",
        }
    }

    /// How long a client should wait before retrying, when known.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DetectError::ServiceUnavailable { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

impl From<BreakerRejection> for DetectError {
    fn from(rejection: BreakerRejection) -> Self {
        DetectError::ServiceUnavailable {
            target: rejection.target,
            state: rejection.state,
            retry_after: rejection.retry_after,
        }
    }
}
