//! Error returned when the breaker refuses a call.

use super::BreakerState;
use std::time::Duration;
use thiserror::Error;

/// The breaker denied a call before any network attempt was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit breaker '{target}' is {state}; retry after {}ms", .retry_after.as_millis())]
pub struct BreakerRejection {
    /// Downstream target the breaker protects
    pub target: String,
    /// State that caused the rejection (open, or half-open with a probe in flight)
    pub state: BreakerState,
    /// Time left until the breaker admits a probe
    pub retry_after: Duration,
}
