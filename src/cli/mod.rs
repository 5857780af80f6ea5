//! CLI module for yolo-remote
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `detect` - Send images to the detection service and print a JSON report
//! - `config` - Configuration utilities (init, show)
//!
//! # Example
//!
//! ```bash
//! # Detect with defaults from yolo-remote.toml
//! yolo-remote detect frame-001.jpg frame-002.jpg
//!
//! # Point at another service and lower the threshold
//! yolo-remote detect --url http://yolo:8001 --confidence 0.1 frame.png
//! ```

pub mod config;
pub mod detect;

pub use config::{handle_config_init, handle_config_show};
pub use detect::run_detect;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// yolo-remote - resilient client for a remote YOLO detection service
#[derive(Parser, Debug)]
#[command(
    name = "yolo-remote",
    version,
    about = "Resilient client for a remote YOLO detection service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run detection on one or more images
    Detect(DetectArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Image files to send
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, default_value = "yolo-remote.toml")]
    pub config: PathBuf,

    /// Override the detection service base URL
    #[arg(short, long, env = "YOLO_REMOTE_URL")]
    pub url: Option<String>,

    /// Confidence threshold (0-1); defaults to service.default_confidence
    #[arg(long)]
    pub confidence: Option<f32>,

    /// Override total attempts per image
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "YOLO_REMOTE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write an example configuration file
    Init(ConfigInitArgs),
    /// Print the effective configuration (file + environment)
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "yolo-remote.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "yolo-remote.toml")]
    pub config: PathBuf,
}
