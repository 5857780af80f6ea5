//! Request and result types for detection calls, plus response validation.

use super::DetectError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One image to run through the detection service.
///
/// Built per call and dropped when the call completes. The image is a
/// shared buffer, so every attempt reuses it without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRequest {
    pub image: Bytes,
    pub filename: String,
    pub confidence_threshold: f32,
}

impl DetectionRequest {
    /// Validate caller input. File type and size are checked upstream of
    /// this crate; only emptiness and the threshold range are checked here.
    pub fn new(
        image: Vec<u8>,
        filename: impl Into<String>,
        confidence_threshold: f32,
    ) -> Result<Self, DetectError> {
        if image.is_empty() {
            return Err(DetectError::InvalidInput("image is empty".to_string()));
        }
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(DetectError::InvalidInput(format!(
                "confidence threshold {} is outside [0, 1]",
                confidence_threshold
            )));
        }

        let filename = filename.into();
        Ok(Self {
            image: Bytes::from(image),
            filename: if filename.is_empty() {
                "upload".to_string()
            } else {
                filename
            },
            confidence_threshold,
        })
    }
}

/// Risk tag attached to a detection by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    /// Missing, null or a tag this client does not know
    #[default]
    Unknown,
}

impl From<Option<String>> for RiskLevel {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("low") => RiskLevel::Low,
            Some("medium") => RiskLevel::Medium,
            Some("high") => RiskLevel::High,
            Some("critical") => RiskLevel::Critical,
            _ => RiskLevel::Unknown,
        }
    }
}

/// A single detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: u32,
    pub class_name: String,
    pub confidence: f32,
    /// Outline as `[x, y]` points
    #[serde(default)]
    pub polygon: Vec<[f32; 2]>,
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Any further fields the service sends (bbox, area, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Successful outcome of [`RemoteInferenceClient::detect`](super::RemoteInferenceClient::detect).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub success: bool,
    pub detections: Vec<Detection>,
    /// Inference time reported by the service
    pub processing_time_ms: u64,
    pub model_version: String,
    /// Network attempts this call needed
    pub attempts: u32,
    /// Wall time measured by the client, retries included
    pub elapsed_ms: u64,
}

/// JSON body returned by the detection service.
#[derive(Deserialize)]
struct DetectResponse {
    status: String,
    #[serde(default)]
    detections: Vec<Detection>,
    processing_time_ms: u64,
    model_version: String,
}

impl DetectionResult {
    /// Parse and validate a 2xx response body.
    pub fn from_body(body: &[u8], attempts: u32, elapsed: Duration) -> Result<Self, DetectError> {
        let response: DetectResponse = serde_json::from_slice(body).map_err(|e| {
            DetectError::MalformedResponse(format!("Failed to parse detection response: {}", e))
        })?;

        if response.status != "success" {
            return Err(DetectError::MalformedResponse(format!(
                "unexpected status '{}'",
                response.status
            )));
        }

        for (i, detection) in response.detections.iter().enumerate() {
            if !(0.0..=1.0).contains(&detection.confidence) {
                return Err(DetectError::MalformedResponse(format!(
                    "detections[{}].confidence {} is outside [0, 1]",
                    i, detection.confidence
                )));
            }
            if detection
                .polygon
                .iter()
                .flatten()
                .any(|coordinate| !coordinate.is_finite())
            {
                return Err(DetectError::MalformedResponse(format!(
                    "detections[{}].polygon has non-finite coordinates",
                    i
                )));
            }
        }

        Ok(Self {
            success: true,
            detections: response.detections,
            processing_time_ms: response.processing_time_ms,
            model_version: response.model_version,
            attempts,
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}
