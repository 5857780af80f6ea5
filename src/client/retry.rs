//! Failure classification and backoff for the retry loop.
//!
//! The loop in [`RemoteInferenceClient`](super::RemoteInferenceClient) never
//! inspects errors itself; it asks [`AttemptClass`] whether to retry and what
//! to tell the breaker.

use super::{TransportError, TransportResponse};
use crate::breaker::CallOutcome;
use rand::Rng;
use std::time::Duration;

/// Kind of transport failure, kept for the error surfaced after the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    Timeout,
    Unreachable,
}

impl TransientKind {
    pub fn of(error: &TransportError) -> Self {
        match error {
            TransportError::PoolTimeout(_) | TransportError::Timeout(_) => TransientKind::Timeout,
            TransportError::Connect(_) => TransientKind::Unreachable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransientKind::Timeout => "timeout",
            TransientKind::Unreachable => "unreachable",
        }
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptClass {
    /// 2xx answer; the body may still be malformed
    Success,
    /// No HTTP status received
    Transient(TransientKind),
    /// Non-2xx answer from a reachable service
    Application { status: u16 },
}

impl AttemptClass {
    pub fn of(result: &Result<TransportResponse, TransportError>) -> Self {
        match result {
            Ok(response) if response.is_success() => AttemptClass::Success,
            Ok(response) => AttemptClass::Application {
                status: response.status,
            },
            Err(error) => AttemptClass::Transient(TransientKind::of(error)),
        }
    }

    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptClass::Transient(_))
    }

    pub fn breaker_outcome(&self) -> CallOutcome {
        match self {
            AttemptClass::Success => CallOutcome::Success,
            AttemptClass::Transient(_) => CallOutcome::TransientFailure,
            AttemptClass::Application { .. } => CallOutcome::Rejected,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttemptClass::Success => "success",
            AttemptClass::Transient(kind) => kind.as_str(),
            AttemptClass::Application { .. } => "upstream_error",
        }
    }
}

/// Exponential backoff with up to 10% jitter before retry number `retry` (1-based).
///
/// The result never exceeds `max`.
pub fn backoff_delay(retry: u32, base: Duration, max: Duration) -> Duration {
    if retry == 0 || base.is_zero() {
        return Duration::ZERO;
    }

    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    let capped = base_ms
        .saturating_mul(2u64.saturating_pow(retry - 1))
        .min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis((capped + jitter).min(max_ms))
}
