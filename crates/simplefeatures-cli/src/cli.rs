use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sf - Simple-features table toolkit
#[derive(Parser, Debug)]
#[command(name = "sf")]
#[command(about = "Cast and inspect simple-features tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./sf.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Geometry column to operate on
    #[arg(long, global = true, value_name = "NAME")]
    pub geometry_column: Option<String>,

    /// Worker threads for row-parallel work (0 = one per core)
    #[arg(long, global = true, value_name = "N")]
    pub workers: Option<usize>,

    /// Characters of WKT shown in geometry previews
    #[arg(long, global = true, value_name = "N")]
    pub preview_length: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decompose geometries into a simpler kind
    Cast(CastArgs),

    /// Insert vertices so no segment exceeds a maximum length
    Segmentize(SegmentizeArgs),

    /// Show a table's schema, metadata and leading rows
    Info(InfoArgs),

    /// Overwrite a table's CRS metadata (no reprojection)
    SetCrs(SetCrsArgs),

    /// Check geometries for structural problems
    Validate(ValidateArgs),

    /// Show effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct CastArgs {
    /// Input table document
    pub input: PathBuf,

    /// Target geometry kind (e.g. polygon, linestring, point)
    #[arg(long)]
    pub to: String,

    /// Write the result here instead of printing a preview
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct SegmentizeArgs {
    /// Input table document
    pub input: PathBuf,

    /// Maximum segment length, in CRS units
    #[arg(long)]
    pub max_length: f64,

    /// Write the result here instead of printing a preview
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Input table document
    pub input: PathBuf,

    /// Number of rows to preview
    #[arg(long, default_value = "10")]
    pub rows: usize,
}

#[derive(Parser, Debug)]
pub struct SetCrsArgs {
    /// Input table document
    pub input: PathBuf,

    /// EPSG code (e.g., 4326 for WGS 84)
    #[arg(long)]
    pub epsg: u32,

    /// Human-readable CRS name
    #[arg(long)]
    pub name: Option<String>,

    /// Also set the declared geometry kind
    #[arg(long, value_name = "KIND")]
    pub geometry_kind: Option<String>,

    /// Write the result here (defaults to overwriting the input)
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Input table document
    pub input: PathBuf,

    /// Fail on the first invalid geometry
    #[arg(long)]
    pub strict: bool,
}
