//! Resilient client for the remote YOLO detection service.
//!
//! # Data Flow
//!
//! ```text
//! detect(image, filename, threshold)
//!     → DetectionRequest::new        (InvalidInput, no network)
//!     → loop attempt 1..=max_attempts
//!         → breaker.try_acquire()    (ServiceUnavailable, no network)
//!         → transport.send()         (one HTTP attempt, bounded by timeouts)
//!         → AttemptClass::of()       (retry? what does the breaker record?)
//!     → DetectionResult::from_body() (MalformedResponse)
//! ```
//!
//! The client, its transport and its breaker are long-lived and shared by
//! every concurrent caller. Never build one per request.

pub mod error;
pub mod retry;
pub mod transport;
pub mod types;

pub use error::DetectError;
pub use retry::{backoff_delay, AttemptClass, TransientKind};
pub use transport::{DetectionTransport, ReqwestTransport, TransportError, TransportResponse};
pub use types::{Detection, DetectionRequest, DetectionResult, RiskLevel};

use crate::breaker::{BreakerRegistry, BreakerSnapshot, CircuitBreaker};
use crate::config::{ConfigError, RemoteConfig, RetryConfig};
use crate::logging::{body_excerpt, generate_request_id};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;

/// Turns one validated image into detections or a typed failure.
pub struct RemoteInferenceClient {
    transport: Arc<dyn DetectionTransport>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
    default_confidence: f32,
}

impl RemoteInferenceClient {
    /// Build a client around an explicit transport and a shared breaker.
    pub fn new(
        transport: Arc<dyn DetectionTransport>,
        breaker: Arc<CircuitBreaker>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            transport,
            breaker,
            retry,
            default_confidence: 0.25,
        }
    }

    /// Build the production client: reqwest transport, breaker from `breakers`.
    pub fn from_config(
        config: &RemoteConfig,
        breakers: &BreakerRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let transport = ReqwestTransport::new(&config.service, &config.http)?;
        tracing::debug!(
            endpoint = transport.endpoint(),
            max_connections = config.http.max_connections,
            max_attempts = config.retry.max_attempts,
            "Built inference client"
        );

        Ok(Self::new(
            Arc::new(transport),
            breakers.get_or_create(&config.service.target_name),
            config.retry.clone(),
        )
        .with_default_confidence(config.service.default_confidence))
    }

    pub fn with_default_confidence(mut self, confidence: f32) -> Self {
        self.default_confidence = confidence;
        self
    }

    pub fn default_confidence(&self) -> f32 {
        self.default_confidence
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Breaker view for a `/health` style endpoint.
    pub fn health(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Run detection with the configured default confidence threshold.
    pub async fn detect_default(
        &self,
        image: Vec<u8>,
        filename: &str,
    ) -> Result<DetectionResult, DetectError> {
        self.detect(image, filename, self.default_confidence).await
    }

    /// Run one image through the detection service.
    ///
    /// Transport failures are retried up to `max_attempts` total attempts.
    /// HTTP status errors, malformed bodies and breaker rejections end the
    /// call immediately. `ServiceUnavailable` is only returned when no
    /// attempt reached the network; if the breaker opens between retries,
    /// the last transport failure is returned instead.
    pub async fn detect(
        &self,
        image: Vec<u8>,
        filename: &str,
        confidence_threshold: f32,
    ) -> Result<DetectionResult, DetectError> {
        let request = DetectionRequest::new(image, filename, confidence_threshold)?;

        let span = tracing::info_span!(
            "detect",
            request_id = %generate_request_id(),
            filename = %request.filename,
            target_name = %self.breaker.name(),
        );

        let started = Instant::now();
        let result = self.run(&request, started).instrument(span).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::histogram!("yolo_remote_detect_duration_seconds", "outcome" => outcome)
            .record(started.elapsed().as_secs_f64());

        result
    }

    async fn run(
        &self,
        request: &DetectionRequest,
        started: Instant,
    ) -> Result<DetectionResult, DetectError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        let mut last_failure: Option<TransportError> = None;

        loop {
            attempt += 1;

            let permit = match self.breaker.try_acquire() {
                Ok(permit) => permit,
                Err(rejection) => {
                    metrics::counter!("yolo_remote_attempts_total", "outcome" => "breaker_rejected")
                        .increment(1);
                    // A call that already reached the network reports its own failure.
                    if let Some(error) = last_failure {
                        tracing::error!(
                            attempt,
                            state = %rejection.state,
                            error = %error,
                            "Circuit breaker opened during retries, giving up"
                        );
                        return Err(exhausted(error, attempt - 1));
                    }
                    tracing::warn!(
                        state = %rejection.state,
                        retry_after_ms = rejection.retry_after.as_millis() as u64,
                        "Circuit breaker rejected detection, service not called"
                    );
                    return Err(rejection.into());
                }
            };

            let attempt_started = Instant::now();
            let result = self.transport.send(request).await;
            let elapsed_ms = attempt_started.elapsed().as_millis() as u64;

            let class = AttemptClass::of(&result);
            permit.record(class.breaker_outcome());
            metrics::counter!("yolo_remote_attempts_total", "outcome" => class.label())
                .increment(1);

            let response = match result {
                Ok(response) => response,
                Err(error) if class.is_retryable() && attempt < max_attempts => {
                    let delay =
                        backoff_delay(attempt, self.retry.base_delay(), self.retry.max_delay());
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        elapsed_ms,
                        failure = class.label(),
                        error = %error,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    last_failure = Some(error);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    continue;
                }
                Err(error) => {
                    tracing::error!(
                        attempt,
                        elapsed_ms,
                        failure = class.label(),
                        error = %error,
                        "Detection failed, retry budget exhausted"
                    );
                    return Err(exhausted(error, attempt));
                }
            };

            if !response.is_success() {
                let body_excerpt = body_excerpt(&response.body);
                tracing::warn!(
                    attempt,
                    elapsed_ms,
                    status = response.status,
                    body = %body_excerpt,
                    "Inference service rejected detection"
                );
                return Err(DetectError::UpstreamError {
                    status: response.status,
                    body_excerpt,
                });
            }

            tracing::debug!(
                attempt,
                elapsed_ms,
                status = response.status,
                "Detection attempt succeeded"
            );
            let parsed = DetectionResult::from_body(&response.body, attempt, started.elapsed());
            if let Err(e) = &parsed {
                tracing::error!(attempt, error = %e, "Inference service broke the response contract");
            }
            return parsed;
        }
    }
}

/// Terminal error for a transport failure after `attempts` network attempts.
fn exhausted(error: TransportError, attempts: u32) -> DetectError {
    let message = error.to_string();
    match TransientKind::of(&error) {
        TransientKind::Timeout => DetectError::UpstreamTimeout { attempts, message },
        TransientKind::Unreachable => DetectError::UpstreamUnreachable { attempts, message },
    }
}

impl std::fmt::Debug for RemoteInferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteInferenceClient")
            .field("endpoint", &self.transport.endpoint())
            .field("breaker", &self.breaker.name())
            .field("retry", &self.retry)
            .field("default_confidence", &self.default_confidence)
            .finish()
    }
}
