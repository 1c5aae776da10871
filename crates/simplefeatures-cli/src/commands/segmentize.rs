//! Segmentize command implementation

use crate::cli::SegmentizeArgs;
use crate::document::{read_table, write_table};
use crate::output::OutputWriter;
use crate::output_types::SegmentizeOutput;
use anyhow::{Context, Result};
use simplefeatures_core::config::LayeredConfig;
use simplefeatures_core::SfError;
use simplefeatures_geo::{segmentize, Decomposer};

pub fn execute(args: SegmentizeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let table = read_table(&args.input)?;

    let column = &config.geometry_column.value;
    if column != table.geometry_column() {
        return Err(SfError::GeometryColumnNotFound {
            column: column.clone(),
            available: table.geometry_column().to_string(),
        }
        .into());
    }

    let pool = Decomposer::with_workers(config.workers.value)?;
    let result = pool
        .install(|| segmentize(&table, args.max_length))
        .with_context(|| format!("Failed to segmentize {}", args.input.display()))?;

    if let Some(ref path) = args.output {
        write_table(path, &result)?;
    }

    if output.is_json() {
        output.result(SegmentizeOutput {
            max_length: args.max_length,
            rows: result.len(),
            output_path: args.output.as_ref().map(|p| p.display().to_string()),
            table: args.output.is_none().then_some(result),
        })?;
        return Ok(());
    }

    output.success(format!(
        "Segmentized {} rows with max segment length {}",
        result.len(),
        args.max_length
    ));

    match args.output {
        Some(path) => output.kv("Written to", path.display()),
        None => {
            output.section("Preview");
            output.table(super::preview_rows(&result, 10, config.preview_length.value));
        }
    }

    Ok(())
}
