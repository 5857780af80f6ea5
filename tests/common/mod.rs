//! Shared test utilities for yolo-remote integration tests.
//!
//! Provides a scripted transport so retry and breaker behavior can be
//! exercised without a network.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use yolo_remote::breaker::{BreakerConfig, CircuitBreaker};
use yolo_remote::client::{
    DetectionRequest, DetectionTransport, RemoteInferenceClient, TransportError,
    TransportResponse,
};
use yolo_remote::config::RetryConfig;

// =============================================================================
// Response Builders
// =============================================================================

/// 2xx body with a single detection at `confidence`.
pub fn success_body(confidence: f32) -> Vec<u8> {
    serde_json::json!({
        "status": "success",
        "detections": [{
            "class_id": 0,
            "class_name": "crack",
            "confidence": confidence,
            "polygon": [[10.0, 10.0], [20.0, 10.0], [20.0, 20.0]],
            "risk_level": "high"
        }],
        "processing_time_ms": 42,
        "model_version": "yolov8n-seg-1.2"
    })
    .to_string()
    .into_bytes()
}

pub fn ok(confidence: f32) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status: 200,
        body: success_body(confidence),
    })
}

pub fn status(status: u16, body: &str) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status,
        body: body.as_bytes().to_vec(),
    })
}

pub fn timeout() -> Result<TransportResponse, TransportError> {
    Err(TransportError::Timeout("read timed out".to_string()))
}

pub fn refused() -> Result<TransportResponse, TransportError> {
    Err(TransportError::Connect("connection refused".to_string()))
}

// =============================================================================
// Scripted Transport
// =============================================================================

/// Replays queued results in order, then repeats `fallback` forever.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    fallback: Result<TransportResponse, TransportError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(
        script: Vec<Result<TransportResponse, TransportError>>,
        fallback: Result<TransportResponse, TransportError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answer with `result`.
    pub fn always(result: Result<TransportResponse, TransportError>) -> Self {
        Self::new(vec![], result)
    }

    /// Sleep before answering, so concurrent calls overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DetectionTransport for ScriptedTransport {
    fn endpoint(&self) -> &str {
        "scripted://detect"
    }

    async fn send(
        &self,
        _request: &DetectionRequest,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

// =============================================================================
// Client Builders
// =============================================================================

pub fn breaker(failure_threshold: u32, reset_timeout_secs: u64) -> Arc<CircuitBreaker> {
    Arc::new(CircuitBreaker::new(
        "yolo-inference",
        BreakerConfig {
            failure_threshold,
            reset_timeout_secs,
        },
    ))
}

/// Client with immediate retries over `transport`.
pub fn client(
    transport: Arc<ScriptedTransport>,
    breaker: Arc<CircuitBreaker>,
    max_attempts: u32,
) -> RemoteInferenceClient {
    RemoteInferenceClient::new(transport, breaker, RetryConfig::immediate(max_attempts))
}

/// Small non-empty payload standing in for a JPEG.
pub fn image() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]
}
