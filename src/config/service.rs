//! Downstream inference service configuration

use serde::{Deserialize, Serialize};

/// Where the detection service lives and how calls to it are labelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the inference service (e.g. "http://yolo:8001")
    pub base_url: String,
    /// Path appended to `base_url` for detection requests
    pub detect_path: String,
    /// Name of the breaker and the label used in logs and metrics
    pub target_name: String,
    /// Confidence threshold used when the caller does not pass one
    pub default_confidence: f32,
}

impl ServiceConfig {
    /// Full detection endpoint URL.
    pub fn detect_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.detect_path.trim_start_matches('/')
        )
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            detect_path: "/detect".to_string(),
            target_name: "yolo-inference".to_string(),
            default_confidence: 0.25,
        }
    }
}
