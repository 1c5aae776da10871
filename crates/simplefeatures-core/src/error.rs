//! Error types for simplefeatures

use thiserror::Error;

use crate::models::GeometryKind;
use crate::wkb::WkbError;

#[derive(Debug, Error)]
pub enum SfError {
    // Cast errors
    #[error("Cannot cast {from} to {to}. Allowed targets follow the hierarchy {hierarchy}")]
    UnsupportedCast {
        from: String,
        to: String,
        hierarchy: String,
    },

    #[error("Geometry at row {row} is {found}, but the table declares {expected}")]
    GeometryKindMismatch {
        row: usize,
        expected: GeometryKind,
        found: GeometryKind,
    },

    #[error("Malformed geometry at row {row}: {source}")]
    MalformedGeometry {
        row: usize,
        #[source]
        source: WkbError,
    },

    // Table errors
    #[error("Geometry column '{column}' not found (table geometry column is '{available}')")]
    GeometryColumnNotFound { column: String, available: String },

    #[error("Table metadata is missing '{key}'")]
    MissingMetadata { key: String },

    #[error("Invalid table: {reason}")]
    InvalidTable { reason: String },

    #[error("Invalid geometry at row {row}: {reason}")]
    InvalidGeometry { row: usize, reason: String },

    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SfError {
    /// Wrap a codec failure with the row it happened on
    pub fn malformed(row: usize, source: WkbError) -> Self {
        SfError::MalformedGeometry { row, source }
    }
}

impl From<serde_json::Error> for SfError {
    fn from(err: serde_json::Error) -> Self {
        SfError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SfError>;
