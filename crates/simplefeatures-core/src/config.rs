use crate::error::{Result, SfError};
use crate::models::{DEFAULT_GEOMETRY_COLUMN, DEFAULT_PREVIEW_LENGTH};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for simplefeatures
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Name of the geometry column operations act on
    pub geometry_column: ConfigValue<String>,
    /// Worker threads for row-parallel operations (0 = one per core)
    pub workers: ConfigValue<usize>,
    /// Characters of WKT shown in geometry previews
    pub preview_length: ConfigValue<usize>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            geometry_column: ConfigValue::new(
                DEFAULT_GEOMETRY_COLUMN.to_string(),
                ConfigSource::Default,
            ),
            workers: ConfigValue::new(0, ConfigSource::Default),
            preview_length: ConfigValue::new(DEFAULT_PREVIEW_LENGTH, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| SfError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| SfError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(geometry_column) = file_config.geometry_column {
            self.geometry_column.update(parse_geometry_column(&geometry_column)?, ConfigSource::File);
        }

        if let Some(workers) = file_config.workers {
            self.workers.update(workers, ConfigSource::File);
        }

        if let Some(preview_length) = file_config.preview_length {
            self.preview_length.update(preview_length, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // SF_GEOMETRY_COLUMN
        if let Ok(column) = env::var("SF_GEOMETRY_COLUMN") {
            match parse_geometry_column(&column) {
                Ok(column) => self.geometry_column.update(column, ConfigSource::Environment),
                Err(_) => tracing::warn!("Ignoring empty SF_GEOMETRY_COLUMN value"),
            }
        }

        // SF_WORKERS
        if let Ok(workers_str) = env::var("SF_WORKERS") {
            match workers_str.parse::<usize>() {
                Ok(workers) => self.workers.update(workers, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SF_WORKERS value '{}': expected a non-negative integer",
                    workers_str
                ),
            }
        }

        // SF_PREVIEW_LENGTH
        if let Ok(length_str) = env::var("SF_PREVIEW_LENGTH") {
            match length_str.parse::<usize>() {
                Ok(length) => self.preview_length.update(length, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SF_PREVIEW_LENGTH value '{}': expected a non-negative integer",
                    length_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(geometry_column) = overrides.geometry_column {
            self.geometry_column.update(geometry_column, ConfigSource::Cli);
        }

        if let Some(workers) = overrides.workers {
            self.workers.update(workers, ConfigSource::Cli);
        }

        if let Some(preview_length) = overrides.preview_length {
            self.preview_length.update(preview_length, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "geometry_column".to_string(),
            (self.geometry_column.value.clone(), self.geometry_column.source),
        );

        let workers = match self.workers.value {
            0 => "auto".to_string(),
            n => n.to_string(),
        };
        map.insert("workers".to_string(), (workers, self.workers.source));

        map.insert(
            "preview_length".to_string(),
            (self.preview_length.value.to_string(), self.preview_length.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    geometry_column: Option<String>,
    workers: Option<usize>,
    preview_length: Option<usize>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub geometry_column: Option<String>,
    pub workers: Option<usize>,
    pub preview_length: Option<usize>,
}

/// Validate a geometry column name
pub fn parse_geometry_column(s: &str) -> Result<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SfError::ConfigInvalid {
            key: "geometry_column".to_string(),
            reason: "Geometry column name cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}
