//! Breaker state, call outcomes and the read-only views handed to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of the breaker in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    /// Calls pass through; transient failures are counted
    #[default]
    Closed,
    /// Calls are rejected without touching the network
    Open,
    /// A single probe call is allowed through
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finished call tells the breaker about the downstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The service answered with a usable response
    Success,
    /// Transport-level failure (timeout, connection error); counted
    TransientFailure,
    /// The service answered but refused the request (HTTP status error).
    /// Never counted: a reachable service is alive.
    Rejected,
}

/// Point-in-time view of a breaker for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub fail_counter: u32,
    pub fail_max: u32,
    pub last_transition: Option<DateTime<Utc>>,
}

/// A single state change, passed to every registered hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub target: String,
    pub from: BreakerState,
    pub to: BreakerState,
    /// Failure counter value at the moment of the transition
    pub fail_counter: u32,
    pub at: DateTime<Utc>,
}
