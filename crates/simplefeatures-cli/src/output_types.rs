use serde::Serialize;
use simplefeatures_core::models::{Crs, FeatureTable, GeometryKind};
use tabled::Tabled;

/// Output for cast command
#[derive(Debug, Serialize)]
pub struct CastOutput {
    pub from: Option<GeometryKind>,
    pub to: Option<GeometryKind>,
    pub input_rows: usize,
    pub output_rows: usize,
    pub provenance_column: Option<String>,
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<FeatureTable>,
}

/// Output for segmentize command
#[derive(Debug, Serialize)]
pub struct SegmentizeOutput {
    pub max_length: f64,
    pub rows: usize,
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<FeatureTable>,
}

/// Output for info command
#[derive(Debug, Serialize)]
pub struct InfoOutput {
    pub geometry_column: String,
    pub columns: Vec<String>,
    pub rows: usize,
    pub crs: Option<Crs>,
    pub declared_kind: Option<GeometryKind>,
    pub inferred_kind: Option<GeometryKind>,
    pub is_spatial: bool,
    pub description: Option<String>,
    pub preview: Vec<RowPreview>,
}

/// One row of a table preview
#[derive(Debug, Serialize, Tabled)]
pub struct RowPreview {
    #[tabled(rename = "Row")]
    pub row: usize,
    #[tabled(rename = "Geometry")]
    pub geometry: String,
    #[tabled(rename = "Attributes")]
    pub attributes: String,
}

/// Output for set-crs command
#[derive(Debug, Serialize)]
pub struct SetCrsOutput {
    pub crs: Crs,
    pub previous_crs: Option<Crs>,
    pub geometry_kind: Option<GeometryKind>,
    pub output_path: String,
}

/// Output for validate command
#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub valid: bool,
    pub rows_checked: usize,
    pub invalid_rows: usize,
    pub issues: Vec<IssueRow>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct IssueRow {
    #[tabled(rename = "Row")]
    pub row: usize,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Problem")]
    pub reason: String,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub geometry_column: ConfigEntry<String>,
    pub workers: ConfigEntry<usize>,
    pub preview_length: ConfigEntry<usize>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry<T> {
    pub value: T,
    pub source: String,
}
