//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use simplefeatures_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "sf.toml";

/// Load layered configuration: defaults, then file, then environment
pub fn load_config(explicit: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_path(explicit) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with the CLI's global overrides applied
pub fn load_config_with_overrides(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    config.update_from_cli(CliConfigOverrides {
        geometry_column: cli.geometry_column.clone(),
        workers: cli.workers,
        preview_length: cli.preview_length,
    });
    Ok(config)
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}
