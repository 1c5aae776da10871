//! simplefeatures Geo - Operations over feature tables
//!
//! This crate handles the geometry operations on tables: casting along the
//! geometry hierarchy, segmentizing lines, and geometry validation.

pub mod cast;
pub mod segmentize;
pub mod validation;

pub use cast::{cast, provenance_column, Decomposer};
pub use segmentize::segmentize;
pub use validation::{validate_table, ValidityMode};
