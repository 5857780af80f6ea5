//! yolo-remote - resilient client for a remote YOLO detection service
//!
//! This library sends images to an HTTP inference service over a bounded
//! connection pool, retries transport failures with backoff, and guards the
//! service with a per-target circuit breaker.

pub mod breaker;
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;

pub use breaker::{BreakerRegistry, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use client::{DetectError, Detection, DetectionResult, RemoteInferenceClient};
pub use config::RemoteConfig;
