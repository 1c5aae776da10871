//! simplefeatures Core - Domain models, WKB codec, and configuration
//!
//! This crate contains the feature table model and the geometry encoding shared
//! by the simplefeatures operations and CLI.

pub mod config;
pub mod error;
pub mod models;
pub mod wkb;

pub use error::{Result, SfError};
