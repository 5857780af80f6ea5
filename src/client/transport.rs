//! Network seam for detection calls.
//!
//! [`DetectionTransport`] performs exactly one attempt and reports either the
//! raw HTTP answer or a transport-level failure. Retries, classification and
//! the breaker live above it in [`RemoteInferenceClient`](super::RemoteInferenceClient).

use super::DetectionRequest;
use crate::config::{ConfigError, HttpConfig, ServiceConfig};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Raw HTTP answer from the detection service, any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer: no status code was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Every connection slot stayed busy for the whole pool timeout.
    #[error("no connection slot free after {}ms", .0.as_millis())]
    PoolTimeout(Duration),

    /// Connect, write or read deadline exceeded.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, reset or otherwise broken.
    #[error("connection failed: {0}")]
    Connect(String),
}

/// One attempt against the detection service.
///
/// Implementations must be cheap to share; a single instance serves every
/// concurrent call.
#[async_trait]
pub trait DetectionTransport: Send + Sync + 'static {
    /// Endpoint this transport talks to, for logs.
    fn endpoint(&self) -> &str;

    /// Send one request. `Ok` means an HTTP status was received, whatever it was.
    async fn send(&self, request: &DetectionRequest)
        -> Result<TransportResponse, TransportError>;
}

/// Production transport: multipart POST over a shared, bounded reqwest pool.
pub struct ReqwestTransport {
    /// Shared HTTP client for connection pooling
    client: Client,
    url: String,
    /// Bounds in-flight requests to `max_connections`
    slots: Arc<Semaphore>,
    pool_timeout: Duration,
    attempt_deadline: Duration,
}

impl ReqwestTransport {
    pub fn new(service: &ServiceConfig, http: &HttpConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .connect_timeout(http.connect_timeout())
            .read_timeout(http.read_timeout())
            .pool_max_idle_per_host(http.max_idle_connections)
            .build()
            .map_err(|e| ConfigError::invalid("http", format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            url: service.detect_url(),
            slots: Arc::new(Semaphore::new(http.max_connections)),
            pool_timeout: http.pool_timeout(),
            attempt_deadline: http.attempt_deadline(),
        })
    }

    /// Free connection slots right now.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Multipart body for one attempt. The image buffer is shared, not copied.
    fn form(request: &DetectionRequest) -> Form {
        let mime = mime_guess::from_path(&request.filename).first_or_octet_stream();
        let part = || {
            Part::stream_with_length(Body::from(request.image.clone()), request.image.len() as u64)
                .file_name(request.filename.clone())
        };
        let part = match part().mime_str(mime.essence_str()) {
            Ok(part) => part,
            // mime_guess only yields valid types; keep the bare part regardless.
            Err(_) => part(),
        };

        Form::new()
            .part("file", part)
            .text("confidence_threshold", request.confidence_threshold.to_string())
    }
}

/// Map a reqwest failure onto the transport taxonomy.
fn classify_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        // Connect errors and mid-flight resets alike: no status was received.
        TransportError::Connect(e.to_string())
    }
}

#[async_trait]
impl DetectionTransport for ReqwestTransport {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn send(
        &self,
        request: &DetectionRequest,
    ) -> Result<TransportResponse, TransportError> {
        let _slot = tokio::time::timeout(self.pool_timeout, self.slots.acquire())
            .await
            .map_err(|_| TransportError::PoolTimeout(self.pool_timeout))?
            .map_err(|_| TransportError::Connect("connection pool closed".to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .multipart(Self::form(request))
            .timeout(self.attempt_deadline)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify_error)?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}
