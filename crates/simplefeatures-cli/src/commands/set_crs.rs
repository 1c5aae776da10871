//! Set-crs command implementation

use crate::cli::SetCrsArgs;
use crate::document::{read_table, write_table};
use crate::output::OutputWriter;
use crate::output_types::SetCrsOutput;
use anyhow::{Context, Result};
use simplefeatures_core::models::{Crs, GeometryKind};

pub fn execute(args: SetCrsArgs, output: &OutputWriter) -> Result<()> {
    let mut table = read_table(&args.input)?;
    let previous_crs = table.crs().cloned();

    let crs = Crs::new(args.epsg, args.name.unwrap_or_else(|| format!("EPSG:{}", args.epsg)));
    table.set_crs(crs.clone());

    if let Some(ref kind) = args.geometry_kind {
        let kind: GeometryKind = kind.parse().context("Invalid --geometry-kind")?;
        table.set_geometry_kind(kind);
    }

    let path = args.output.as_ref().unwrap_or(&args.input);
    write_table(path, &table)?;

    if output.is_json() {
        output.result(SetCrsOutput {
            crs,
            previous_crs,
            geometry_kind: table.geometry_kind(),
            output_path: path.display().to_string(),
        })?;
        return Ok(());
    }

    if let Some(previous) = previous_crs {
        output.warning(format!("Replaced CRS {} (coordinates were not reprojected)", previous));
    }
    output.success(format!("Set CRS to {}", crs));
    output.kv("Written to", path.display());

    Ok(())
}
