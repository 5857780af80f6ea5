//! Detect command implementation

use crate::breaker::{BreakerRegistry, BreakerSnapshot};
use crate::cli::DetectArgs;
use crate::client::{DetectError, DetectionResult, RemoteInferenceClient};
use crate::config::RemoteConfig;
use crate::logging::init_tracing;
use serde::Serialize;
use std::path::Path;

/// Load configuration with CLI overrides applied
pub fn load_config_with_overrides(args: &DetectArgs) -> anyhow::Result<RemoteConfig> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        RemoteConfig::load(Some(&args.config))?
    } else {
        RemoteConfig::default()
    };

    config = config.with_env_overrides();

    // CLI overrides (highest priority)
    if let Some(ref url) = args.url {
        config.service.base_url = url.clone();
    }
    if let Some(confidence) = args.confidence {
        config.service.default_confidence = confidence;
    }
    if let Some(attempts) = args.max_attempts {
        config.retry.max_attempts = attempts;
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Outcome for one image in the printed report.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ImageReport {
    Detected {
        file: String,
        #[serde(flatten)]
        result: DetectionResult,
    },
    Failed {
        file: String,
        success: bool,
        kind: String,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        http_status: Option<u16>,
    },
}

impl ImageReport {
    fn from_outcome(file: &Path, outcome: Result<DetectionResult, DetectError>) -> Self {
        let file = file.display().to_string();
        match outcome {
            Ok(result) => ImageReport::Detected { file, result },
            Err(e) => ImageReport::Failed {
                file,
                success: false,
                kind: e.kind().to_string(),
                error: e.to_string(),
                http_status: Some(e.status_code()),
            },
        }
    }

    fn unreadable(file: &Path, error: std::io::Error) -> Self {
        ImageReport::Failed {
            file: file.display().to_string(),
            success: false,
            kind: "unreadable_file".to_string(),
            error: error.to_string(),
            http_status: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ImageReport::Detected { .. })
    }
}

/// Full report printed to stdout.
#[derive(Debug, Serialize)]
pub struct DetectReport {
    pub results: Vec<ImageReport>,
    pub breaker: BreakerSnapshot,
}

/// Run the detect command. Returns `Ok(false)` when any image failed.
pub async fn run_detect(args: DetectArgs) -> anyhow::Result<bool> {
    let config = load_config_with_overrides(&args)?;

    init_tracing(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let breakers = BreakerRegistry::new(config.breaker.clone());
    let client = RemoteInferenceClient::from_config(&config, &breakers)?;

    tracing::info!(
        images = args.images.len(),
        url = %config.service.detect_url(),
        "Starting detection run"
    );

    let results = futures::future::join_all(
        args.images
            .iter()
            .map(|path| detect_file(&client, path)),
    )
    .await;

    let report = DetectReport {
        results,
        breaker: client.health(),
    };
    let all_ok = report.results.iter().all(ImageReport::is_success);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(all_ok)
}

async fn detect_file(client: &RemoteInferenceClient, path: &Path) -> ImageReport {
    let image = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Cannot read image");
            return ImageReport::unreadable(path, e);
        }
    };

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    ImageReport::from_outcome(path, client.detect_default(image, &filename).await)
}
