//! Config command implementation

use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};
use anyhow::Result;
use simplefeatures_core::config::LayeredConfig;
use tabled::Tabled;

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    if output.is_json() {
        output.result(ConfigOutput {
            geometry_column: ConfigEntry {
                value: config.geometry_column.value.clone(),
                source: format!("{:?}", config.geometry_column.source),
            },
            workers: ConfigEntry {
                value: config.workers.value,
                source: format!("{:?}", config.workers.source),
            },
            preview_length: ConfigEntry {
                value: config.preview_length.value,
                source: format!("{:?}", config.preview_length.source),
            },
        })?;
        return Ok(());
    }

    output.section("Configuration Values");

    #[derive(Tabled)]
    struct ConfigRow {
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();

    // Sort by key for consistent output
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    output.table(rows);

    output.section("Configuration Precedence");
    output.info("CLI arguments > Environment variables > Config file > Defaults");

    Ok(())
}
