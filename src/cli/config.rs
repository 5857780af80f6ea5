//! Config command handlers

use crate::cli::{ConfigInitArgs, ConfigShowArgs};
use crate::config::{RemoteConfig, EXAMPLE_CONFIG};
use anyhow::{bail, Context};
use std::fs;

/// Handle `yolo-remote config init`
pub fn handle_config_init(args: &ConfigInitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        );
    }

    fs::write(&args.output, EXAMPLE_CONFIG)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!("Configuration file created: {}", args.output.display());
    Ok(())
}

/// Handle `yolo-remote config show`
pub fn handle_config_show(args: &ConfigShowArgs) -> anyhow::Result<()> {
    let config = if args.config.exists() {
        RemoteConfig::load(Some(&args.config))?
    } else {
        RemoteConfig::default()
    }
    .with_env_overrides();

    print!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("yolo-remote.toml");

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: false,
        };
        handle_config_init(&args).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("[breaker]"));
        let parsed: RemoteConfig = toml::from_str(&content).unwrap();
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_config_init_no_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("yolo-remote.toml");
        std::fs::write(&output_path, "existing").unwrap();

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: false,
        };
        assert!(handle_config_init(&args).is_err());
        assert_eq!(std::fs::read_to_string(&output_path).unwrap(), "existing");
    }

    #[test]
    fn test_config_init_force_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("yolo-remote.toml");
        std::fs::write(&output_path, "old content").unwrap();

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: true,
        };
        handle_config_init(&args).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("[service]"));
    }

    #[test]
    fn test_config_show_rejects_broken_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "[retry\n").unwrap();

        let args = ConfigShowArgs { config: path };
        assert!(handle_config_show(&args).is_err());
    }
}
