//! Info command implementation

use crate::cli::InfoArgs;
use crate::document::read_table;
use crate::output::OutputWriter;
use crate::output_types::InfoOutput;
use anyhow::Result;
use simplefeatures_core::config::LayeredConfig;

pub fn execute(args: InfoArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let table = read_table(&args.input)?;
    let preview = super::preview_rows(&table, args.rows, config.preview_length.value);
    let inferred_kind = table.infer_geometry_kind();

    if output.is_json() {
        output.result(InfoOutput {
            geometry_column: table.geometry_column().to_string(),
            columns: table.columns().to_vec(),
            rows: table.len(),
            crs: table.crs().cloned(),
            declared_kind: table.geometry_kind(),
            inferred_kind,
            is_spatial: table.is_spatial(),
            description: table.description().map(str::to_string),
            preview,
        })?;
        return Ok(());
    }

    output.section("Table");
    output.kv("Rows", table.len());
    output.kv("Geometry column", table.geometry_column());
    output.kv("Columns", table.columns().join(", "));

    output.section("Metadata");
    output.kv(
        "CRS",
        table.crs().map(|c| c.to_string()).unwrap_or_else(|| "(none)".to_string()),
    );
    output.kv(
        "Declared kind",
        table.geometry_kind().map(|k| k.to_string()).unwrap_or_else(|| "(none)".to_string()),
    );
    output.kv(
        "Inferred kind",
        inferred_kind.map(|k| k.to_string()).unwrap_or_else(|| "(mixed or empty)".to_string()),
    );
    output.kv("Spatial", table.is_spatial());
    if let Some(description) = table.description() {
        output.kv("Description", description);
    }

    if let (Some(declared), Some(inferred)) = (table.geometry_kind(), inferred_kind) {
        if declared != inferred && inferred.multi() != declared {
            output.warning(format!(
                "Rows hold {} geometries but the table declares {}",
                inferred, declared
            ));
        }
    }

    output.section("Rows");
    output.table(preview);

    Ok(())
}
