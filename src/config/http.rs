//! HTTP timeout and connection pool configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-attempt timeouts and connection pool bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    /// How long a call may wait for a free connection slot
    pub pool_timeout_ms: u64,
    /// Maximum concurrent in-flight requests
    pub max_connections: usize,
    /// Maximum idle keep-alive connections kept in the pool
    pub max_idle_connections: usize,
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_timeout_ms)
    }

    /// Upper bound for one attempt, from connect to the last body byte.
    pub fn attempt_deadline(&self) -> Duration {
        self.connect_timeout() + self.write_timeout() + self.read_timeout()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
            write_timeout_ms: 10_000,
            pool_timeout_ms: 5_000,
            max_connections: 100,
            max_idle_connections: 20,
        }
    }
}
