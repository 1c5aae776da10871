//! Reading and writing table documents

use anyhow::{Context, Result};
use simplefeatures_core::models::FeatureTable;
use std::fs;
use std::path::Path;

/// Read a JSON table document
pub fn read_table(path: &Path) -> Result<FeatureTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table: FeatureTable = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse table document {}", path.display()))?;
    tracing::debug!("Read {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Write a table as a pretty-printed JSON document
pub fn write_table(path: &Path, table: &FeatureTable) -> Result<()> {
    let content = serde_json::to_string_pretty(table).context("Failed to serialize table")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
