//! Cast command implementation

use crate::cli::CastArgs;
use crate::document::{read_table, write_table};
use crate::output::OutputWriter;
use crate::output_types::CastOutput;
use anyhow::{Context, Result};
use simplefeatures_core::config::LayeredConfig;
use simplefeatures_core::models::{FeatureTable, GeometryKind};
use simplefeatures_geo::{provenance_column, Decomposer};

pub fn execute(args: CastArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let table = read_table(&args.input)?;

    let decomposer = Decomposer::with_workers(config.workers.value)?;
    let result = decomposer
        .cast(&table, &args.to, &config.geometry_column.value)
        .with_context(|| format!("Failed to cast {} to {}", args.input.display(), args.to))?;

    let provenance = added_provenance_column(&table, &result);

    if let Some(ref path) = args.output {
        write_table(path, &result)?;
    }

    if output.is_json() {
        output.result(CastOutput {
            from: table.geometry_kind(),
            to: result.geometry_kind(),
            input_rows: table.len(),
            output_rows: result.len(),
            provenance_column: provenance,
            output_path: args.output.as_ref().map(|p| p.display().to_string()),
            table: args.output.is_none().then_some(result),
        })?;
        return Ok(());
    }

    output.success(format!(
        "Cast {} rows to {} rows of {}",
        table.len(),
        result.len(),
        result.geometry_kind().map(|k| k.to_string()).unwrap_or_default()
    ));
    if let Some(column) = provenance {
        output.kv("Provenance column", column);
    }

    match args.output {
        Some(path) => output.kv("Written to", path.display()),
        None => {
            output.section("Preview");
            output.table(super::preview_rows(&result, 10, config.preview_length.value));
        }
    }

    Ok(())
}

/// Provenance column present in the cast result but not in its input
fn added_provenance_column(input: &FeatureTable, result: &FeatureTable) -> Option<String> {
    GeometryKind::HIERARCHY
        .into_iter()
        .map(provenance_column)
        .find(|name| result.column_index(name).is_some() && input.column_index(name).is_none())
}
