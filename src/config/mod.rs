//! Configuration module for yolo-remote
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`YOLO_REMOTE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! The library never reads the environment on its own; only the binary calls
//! [`RemoteConfig::with_env_overrides`].
//!
//! # Example
//!
//! ```rust
//! use yolo_remote::config::RemoteConfig;
//!
//! let config = RemoteConfig::default();
//! assert_eq!(config.retry.max_attempts, 3);
//!
//! let toml = r#"
//! [service]
//! base_url = "http://yolo:9000"
//! "#;
//! let config: RemoteConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.service.base_url, "http://yolo:9000");
//! assert_eq!(config.breaker.failure_threshold, 5);
//! ```

pub mod error;
pub mod http;
pub mod logging;
pub mod retry;
pub mod service;

pub use error::ConfigError;
pub use http::HttpConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use retry::RetryConfig;
pub use service::ServiceConfig;

// Re-export BreakerConfig from breaker module
pub use crate::breaker::BreakerConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Example configuration written by `yolo-remote config init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../yolo-remote.example.toml");

/// Unified configuration for the remote detection client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RemoteConfig {
    /// Downstream service location
    pub service: ServiceConfig,
    /// Timeouts and connection pool bounds
    pub http: HttpConfig,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
    /// Circuit breaker thresholds
    pub breaker: BreakerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl RemoteConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (previous values are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("YOLO_REMOTE_URL") {
            self.service.base_url = url;
        }
        if let Ok(level) = std::env::var("YOLO_REMOTE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("YOLO_REMOTE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(attempts) = std::env::var("YOLO_REMOTE_MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.retry.max_attempts = n;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.service.base_url)
            .map_err(|e| ConfigError::invalid("service.base_url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "service.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.service.target_name.is_empty() {
            return Err(ConfigError::invalid(
                "service.target_name",
                "target name cannot be empty",
            ));
        }
        if !(0.0..=1.0).contains(&self.service.default_confidence) {
            return Err(ConfigError::invalid(
                "service.default_confidence",
                "must be between 0 and 1",
            ));
        }

        let timeouts = [
            ("http.connect_timeout_ms", self.http.connect_timeout_ms),
            ("http.read_timeout_ms", self.http.read_timeout_ms),
            ("http.write_timeout_ms", self.http.write_timeout_ms),
            ("http.pool_timeout_ms", self.http.pool_timeout_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::invalid(field, "timeout must be non-zero"));
            }
        }
        if self.http.max_connections == 0 {
            return Err(ConfigError::invalid(
                "http.max_connections",
                "must allow at least one connection",
            ));
        }
        if self.http.max_idle_connections > self.http.max_connections {
            return Err(ConfigError::invalid(
                "http.max_idle_connections",
                "cannot exceed http.max_connections",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "retry.max_attempts",
                "at least one attempt is required",
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::invalid(
                "retry.base_delay_ms",
                "cannot exceed retry.max_delay_ms",
            ));
        }

        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::invalid(
                "breaker.failure_threshold",
                "threshold must be non-zero",
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_remote_config_defaults() {
        let config = RemoteConfig::default();
        assert_eq!(config.service.base_url, "http://localhost:8001");
        assert_eq!(config.http.max_connections, 100);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.reset_timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_example_toml() {
        let config: RemoteConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.http.read_timeout_ms, 30_000);
    }

    #[test]
    fn test_config_parse_partial_sections() {
        let toml = r#"
        [retry]
        max_attempts = 5

        [breaker]
        reset_timeout_secs = 10
        "#;

        let config: RemoteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 100); // Default
        assert_eq!(config.breaker.reset_timeout_secs, 10);
        assert_eq!(config.breaker.failure_threshold, 5); // Default
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[http]\nconnect_timeout_ms = 250").unwrap();

        let config = RemoteConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.http.connect_timeout_ms, 250);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[http\nbroken").unwrap();

        let result = RemoteConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = RemoteConfig::load(Some(Path::new("/nonexistent/yolo-remote.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = RemoteConfig::load(None).unwrap();
        assert_eq!(config, RemoteConfig::default());
    }

    #[test]
    fn test_config_env_override_url() {
        std::env::set_var("YOLO_REMOTE_URL", "http://10.0.0.7:8001");
        let config = RemoteConfig::default().with_env_overrides();
        std::env::remove_var("YOLO_REMOTE_URL");

        assert_eq!(config.service.base_url, "http://10.0.0.7:8001");
    }

    #[test]
    fn test_config_env_override_max_attempts() {
        std::env::set_var("YOLO_REMOTE_MAX_ATTEMPTS", "not-a-number");
        let config = RemoteConfig::default().with_env_overrides();
        assert_eq!(config.retry.max_attempts, 3);

        std::env::set_var("YOLO_REMOTE_MAX_ATTEMPTS", "5");
        let config = RemoteConfig::default().with_env_overrides();
        std::env::remove_var("YOLO_REMOTE_MAX_ATTEMPTS");
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_config_env_override_log_format() {
        std::env::set_var("YOLO_REMOTE_LOG_FORMAT", "json");
        let config = RemoteConfig::default().with_env_overrides();
        assert_eq!(config.logging.format, LogFormat::Json);

        std::env::set_var("YOLO_REMOTE_LOG_FORMAT", "xml");
        let config = RemoteConfig::default().with_env_overrides();
        std::env::remove_var("YOLO_REMOTE_LOG_FORMAT");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = RemoteConfig::default();
        config.service.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "service.base_url"
        ));

        config.service.base_url = "ftp://yolo".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref message, .. }) if message.contains("scheme")
        ));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = RemoteConfig::default();
        config.http.read_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "http.read_timeout_ms"
        ));
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut config = RemoteConfig::default();
        config.http.max_idle_connections = 200;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "http.max_idle_connections"
        ));

        config.http.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_retry_and_breaker() {
        let mut config = RemoteConfig::default();
        config.retry.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "retry.max_attempts"
        ));

        let mut config = RemoteConfig::default();
        config.retry.base_delay_ms = 5_000;
        assert!(config.validate().is_err());

        let mut config = RemoteConfig::default();
        config.breaker.failure_threshold = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "breaker.failure_threshold"
        ));
    }

    #[test]
    fn test_config_validation_confidence_range() {
        let mut config = RemoteConfig::default();
        config.service.default_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_toml_render_parses_back() {
        let mut config = RemoteConfig::default();
        config.retry.max_attempts = 7;
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[breaker]"));

        let parsed: RemoteConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.retry.max_attempts, 7);
    }
}
