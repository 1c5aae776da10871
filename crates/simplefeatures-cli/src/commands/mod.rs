//! Command implementations

mod cast;
mod config;
mod info;
mod segmentize;
mod set_crs;
mod validate;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use crate::output_types::RowPreview;
use anyhow::Result;
use simplefeatures_core::models::FeatureTable;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config_with_overrides(&cli)?;

    match cli.command {
        Commands::Cast(args) => cast::execute(args, &config, &output),
        Commands::Segmentize(args) => segmentize::execute(args, &config, &output),
        Commands::Info(args) => info::execute(args, &config, &output),
        Commands::SetCrs(args) => set_crs::execute(args, &output),
        Commands::Validate(args) => validate::execute(args, &output),
        Commands::Config => config::execute(&config, &output),
    }
}

/// First `limit` rows with abbreviated geometries
fn preview_rows(table: &FeatureTable, limit: usize, preview_length: usize) -> Vec<RowPreview> {
    table
        .rows()
        .iter()
        .take(limit)
        .enumerate()
        .map(|(row, feature)| RowPreview {
            row,
            geometry: feature
                .geometry
                .preview_with(preview_length)
                .unwrap_or_else(|_| feature.geometry.preview().to_string()),
            attributes: table
                .columns()
                .iter()
                .zip(&feature.attributes)
                .map(|(column, value)| format!("{}={}", column, value))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}
