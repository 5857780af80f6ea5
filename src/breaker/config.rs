//! Configuration for the circuit breaker.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds for one downstream target's circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive transient failures before the breaker opens
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before admitting a probe
    pub reset_timeout_secs: u64,
}

impl BreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_secs: 60,
        }
    }
}
