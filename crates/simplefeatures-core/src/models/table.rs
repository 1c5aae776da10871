//! Feature tables: rows of one geometry plus named attributes, with typed metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::geometry::{Crs, Geometry, GeometryKind};
use crate::error::{Result, SfError};

/// Default name of the geometry column
pub const DEFAULT_GEOMETRY_COLUMN: &str = "geom";

/// Table-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Coordinate reference system of every geometry in the table
    pub crs: Option<Crs>,

    /// Declared geometry kind
    pub geometry_kind: Option<GeometryKind>,

    /// Free-form description
    pub description: Option<String>,
}

/// One row of a feature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,

    /// Attribute values, aligned with the table's columns
    pub attributes: Vec<Value>,
}

impl Feature {
    pub fn new(geometry: Geometry, attributes: Vec<Value>) -> Self {
        Self { geometry, attributes }
    }
}

/// Ordered collection of features sharing one attribute schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableDocument")]
pub struct FeatureTable {
    geometry_column: String,
    columns: Vec<String>,
    rows: Vec<Feature>,
    metadata: TableMetadata,
}

/// Unvalidated serialized form of a [`FeatureTable`]
#[derive(Deserialize)]
struct TableDocument {
    #[serde(default = "default_geometry_column")]
    geometry_column: String,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Feature>,
    #[serde(default)]
    metadata: TableMetadata,
}

fn default_geometry_column() -> String {
    DEFAULT_GEOMETRY_COLUMN.to_string()
}

impl TryFrom<TableDocument> for FeatureTable {
    type Error = SfError;

    fn try_from(doc: TableDocument) -> Result<Self> {
        FeatureTable::new(doc.geometry_column, doc.columns, doc.rows, doc.metadata)
    }
}

impl FeatureTable {
    /// Create a table, checking that every row matches the column list
    pub fn new(
        geometry_column: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Feature>,
        metadata: TableMetadata,
    ) -> Result<Self> {
        let geometry_column = geometry_column.into();

        if columns.iter().any(|c| *c == geometry_column) {
            return Err(SfError::InvalidTable {
                reason: format!("attribute column '{}' clashes with the geometry column", geometry_column),
            });
        }

        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(SfError::InvalidTable {
                    reason: format!("duplicate column '{}'", column),
                });
            }
        }

        if let Some((row, feature)) =
            rows.iter().enumerate().find(|(_, f)| f.attributes.len() != columns.len())
        {
            return Err(SfError::InvalidTable {
                reason: format!(
                    "row {} has {} attribute values, expected {}",
                    row,
                    feature.attributes.len(),
                    columns.len()
                ),
            });
        }

        Ok(Self { geometry_column, columns, rows, metadata })
    }

    /// Create an empty table with the given schema
    pub fn empty(geometry_column: impl Into<String>, columns: Vec<String>) -> Result<Self> {
        Self::new(geometry_column, columns, Vec::new(), TableMetadata::default())
    }

    pub fn geometry_column(&self) -> &str {
        &self.geometry_column
    }

    /// Attribute column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one attribute column
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|f| &f.attributes[index]).collect())
    }

    pub fn rows(&self) -> &[Feature] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Feature> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn geometries(&self) -> impl Iterator<Item = &Geometry> {
        self.rows.iter().map(|f| &f.geometry)
    }

    /// Append a row
    pub fn push(&mut self, feature: Feature) -> Result<()> {
        if feature.attributes.len() != self.columns.len() {
            return Err(SfError::InvalidTable {
                reason: format!(
                    "row has {} attribute values, expected {}",
                    feature.attributes.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(feature);
        Ok(())
    }

    /// Replace every row's geometry, keeping attributes and metadata
    pub fn with_geometries(&self, geometries: Vec<Geometry>) -> Result<Self> {
        if geometries.len() != self.rows.len() {
            return Err(SfError::InvalidTable {
                reason: format!(
                    "got {} geometries for {} rows",
                    geometries.len(),
                    self.rows.len()
                ),
            });
        }
        let rows = self
            .rows
            .iter()
            .zip(geometries)
            .map(|(feature, geometry)| Feature::new(geometry, feature.attributes.clone()))
            .collect();
        Ok(Self { rows, ..self.clone_schema() })
    }

    /// Add an attribute column, or overwrite it if a column with that name exists
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(SfError::InvalidTable {
                reason: format!(
                    "column '{}' has {} values for {} rows",
                    name,
                    values.len(),
                    self.rows.len()
                ),
            });
        }
        if name == self.geometry_column {
            return Err(SfError::InvalidTable {
                reason: format!("'{}' is the geometry column", name),
            });
        }

        match self.column_index(&name) {
            Some(index) => {
                for (feature, value) in self.rows.iter_mut().zip(values) {
                    feature.attributes[index] = value;
                }
            }
            None => {
                self.columns.push(name);
                for (feature, value) in self.rows.iter_mut().zip(values) {
                    feature.attributes.push(value);
                }
            }
        }
        Ok(())
    }

    /// Same schema and metadata, no rows
    pub fn clone_schema(&self) -> Self {
        Self {
            geometry_column: self.geometry_column.clone(),
            columns: self.columns.clone(),
            rows: Vec::new(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut TableMetadata {
        &mut self.metadata
    }

    pub fn with_metadata(mut self, metadata: TableMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Erase this table's metadata and copy `other`'s
    pub fn replace_metadata(&mut self, other: &FeatureTable) {
        self.metadata = other.metadata.clone();
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.metadata.crs.as_ref()
    }

    /// Set the CRS. This overwrites existing CRS info and never reprojects.
    pub fn set_crs(&mut self, crs: Crs) {
        self.metadata.crs = Some(crs);
    }

    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        self.metadata.geometry_kind
    }

    pub fn set_geometry_kind(&mut self, kind: GeometryKind) {
        self.metadata.geometry_kind = Some(kind);
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.metadata.description = Some(description.into());
    }

    /// True when the table carries CRS metadata and a geometry column
    pub fn is_spatial(&self) -> bool {
        self.metadata.crs.is_some() && !self.geometry_column.is_empty()
    }

    /// Common kind of all rows, read from their WKB headers.
    ///
    /// Returns `None` for empty tables, mixed kinds, or unreadable headers.
    pub fn infer_geometry_kind(&self) -> Option<GeometryKind> {
        let mut kinds = self.rows.iter().map(|f| f.geometry.kind().ok());
        let first = kinds.next()??;
        kinds.all(|k| k == Some(first)).then_some(first)
    }
}
