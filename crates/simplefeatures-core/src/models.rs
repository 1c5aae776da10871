pub mod geometry;
pub mod table;

pub use geometry::{preview, Crs, Geometry, GeometryKind, DEFAULT_PREVIEW_LENGTH};
pub use table::{Feature, FeatureTable, TableMetadata, DEFAULT_GEOMETRY_COLUMN};
