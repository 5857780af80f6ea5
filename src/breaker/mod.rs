//! Circuit breaker guarding a single downstream target.
//!
//! # States
//!
//! ```text
//! Closed   --(fail_counter reaches failure_threshold)--> Open
//! Open     --(reset_timeout elapsed, next call)-------->  HalfOpen
//! HalfOpen --(probe succeeds or is rejected upstream)-->  Closed
//! HalfOpen --(probe fails transiently)----------------->  Open
//! ```
//!
//! Only transient (transport-level) failures are counted. HTTP status answers
//! come from a live service and are reported as [`CallOutcome::Rejected`],
//! which resets the counter like a success.
//!
//! All reads and writes of the state, counter and open timestamp happen under
//! one mutex, so the increment, the threshold check and the transition are a
//! single step. Hooks run after the lock is released.

mod config;
mod error;
mod registry;
mod state;


pub use config::BreakerConfig;
pub use error::BreakerRejection;
pub use registry::BreakerRegistry;
pub use state::{BreakerSnapshot, BreakerState, CallOutcome, StateTransition};

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Synchronous observer invoked on every state transition.
pub type TransitionHook = Arc<dyn Fn(&StateTransition) + Send + Sync>;

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    fail_counter: u32,
    opened_at: Option<Instant>,
    last_transition: Option<DateTime<Utc>>,
    /// Bumped on every transition; permits from older generations are stale
    generation: u64,
    probe_in_flight: bool,
}

/// Shared, process-wide breaker for one downstream service.
///
/// Construct once per target and share it through an `Arc`; every call to
/// the target acquires a [`Permit`] and reports the outcome through it.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
    hooks: Vec<TransitionHook>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                fail_counter: 0,
                opened_at: None,
                last_transition: None,
                generation: 0,
                probe_in_flight: false,
            }),
            hooks: Vec::new(),
        }
    }

    /// Register a hook called synchronously on every transition.
    pub fn with_hook<F>(self, hook: F) -> Self
    where
        F: Fn(&StateTransition) + Send + Sync + 'static,
    {
        self.with_shared_hook(Arc::new(hook))
    }

    pub fn with_shared_hook(mut self, hook: TransitionHook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn fail_counter(&self) -> u32 {
        self.lock().fail_counter
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            fail_counter: inner.fail_counter,
            fail_max: self.config.failure_threshold,
            last_transition: inner.last_transition,
        }
    }

    /// Ask permission for one call.
    ///
    /// An open breaker whose reset timeout has elapsed moves to half-open and
    /// hands out the single probe permit. Everything else that is not closed
    /// is rejected without touching the network.
    pub fn try_acquire(&self) -> Result<Permit<'_>, BreakerRejection> {
        let reset_timeout = self.config.reset_timeout();
        let mut transition = None;

        let result = {
            let mut inner = self.lock();
            match inner.state {
                BreakerState::Closed => Ok(Permit::new(self, inner.generation, false)),
                BreakerState::Open => {
                    let elapsed = inner
                        .opened_at
                        .map(|at| at.elapsed())
                        .unwrap_or(reset_timeout);
                    if elapsed >= reset_timeout {
                        transition = Some(self.transition(&mut inner, BreakerState::HalfOpen));
                        inner.probe_in_flight = true;
                        Ok(Permit::new(self, inner.generation, true))
                    } else {
                        Err(self.rejection(BreakerState::Open, reset_timeout - elapsed))
                    }
                }
                BreakerState::HalfOpen => {
                    if inner.probe_in_flight {
                        Err(self.rejection(BreakerState::HalfOpen, Duration::ZERO))
                    } else {
                        inner.probe_in_flight = true;
                        Ok(Permit::new(self, inner.generation, true))
                    }
                }
            }
        };

        if let Some(transition) = transition {
            self.notify(&transition);
        }
        result
    }

    fn on_outcome(&self, generation: u64, outcome: CallOutcome) {
        let transition = {
            let mut inner = self.lock();
            if generation != inner.generation {
                tracing::debug!(
                    target_name = %self.name,
                    permit_generation = generation,
                    current_generation = inner.generation,
                    ?outcome,
                    "Ignoring outcome admitted before the last breaker transition"
                );
                None
            } else {
                match (inner.state, outcome) {
                    (BreakerState::Closed, CallOutcome::Success | CallOutcome::Rejected) => {
                        inner.fail_counter = 0;
                        None
                    }
                    (BreakerState::Closed, CallOutcome::TransientFailure) => {
                        inner.fail_counter = inner.fail_counter.saturating_add(1);
                        if inner.fail_counter >= self.config.failure_threshold {
                            Some(self.transition(&mut inner, BreakerState::Open))
                        } else {
                            None
                        }
                    }
                    (BreakerState::HalfOpen, CallOutcome::Success | CallOutcome::Rejected) => {
                        Some(self.transition(&mut inner, BreakerState::Closed))
                    }
                    (BreakerState::HalfOpen, CallOutcome::TransientFailure) => {
                        inner.fail_counter = inner.fail_counter.saturating_add(1);
                        Some(self.transition(&mut inner, BreakerState::Open))
                    }
                    // Open never issues permits within its own generation.
                    (BreakerState::Open, _) => None,
                }
            }
        };

        if let Some(transition) = transition {
            self.notify(&transition);
        }
    }

    /// Free the probe slot of a half-open permit dropped without an outcome.
    fn release_probe(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == BreakerState::HalfOpen {
            inner.probe_in_flight = false;
        }
    }

    fn transition(&self, inner: &mut Inner, to: BreakerState) -> StateTransition {
        let from = inner.state;
        let now = Utc::now();

        inner.state = to;
        inner.generation += 1;
        inner.last_transition = Some(now);
        inner.probe_in_flight = false;
        match to {
            BreakerState::Closed => {
                inner.fail_counter = 0;
                inner.opened_at = None;
            }
            BreakerState::Open => inner.opened_at = Some(Instant::now()),
            BreakerState::HalfOpen => {}
        }

        StateTransition {
            target: self.name.clone(),
            from,
            to,
            fail_counter: inner.fail_counter,
            at: now,
        }
    }

    fn notify(&self, transition: &StateTransition) {
        match transition.to {
            BreakerState::Open => tracing::warn!(
                target_name = %transition.target,
                from = %transition.from,
                fail_counter = transition.fail_counter,
                reset_timeout_secs = self.config.reset_timeout_secs,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(
                target_name = %transition.target,
                from = %transition.from,
                to = %transition.to,
                "Circuit breaker state changed"
            ),
        }

        metrics::counter!("yolo_remote_breaker_transitions_total",
            "target" => transition.target.clone(),
            "to" => transition.to.as_str()
        )
        .increment(1);

        for hook in &self.hooks {
            hook(transition);
        }
    }

    fn rejection(&self, state: BreakerState, retry_after: Duration) -> BreakerRejection {
        BreakerRejection {
            target: self.name.clone(),
            state,
            retry_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State stays consistent across a panicking hook: hooks run unlocked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("inner", &*self.lock())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Admission for exactly one call through the breaker.
///
/// Consume it with [`Permit::record`]. A half-open probe permit dropped
/// without a recorded outcome frees the probe slot for the next caller.
#[must_use = "a permit must record the call outcome"]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    probe: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, generation: u64, probe: bool) -> Self {
        Self {
            breaker,
            generation,
            probe,
            settled: false,
        }
    }

    /// Whether this permit is the half-open probe.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn record(mut self, outcome: CallOutcome) {
        self.settled = true;
        self.breaker.on_outcome(self.generation, outcome);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.release_probe(self.generation);
        }
    }
}
