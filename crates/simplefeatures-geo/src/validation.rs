use serde::{Deserialize, Serialize};

use simplefeatures_core::error::{Result, SfError};
use simplefeatures_core::models::FeatureTable;

/// Geometry validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValidityMode {
    /// Fail on the first invalid or malformed geometry
    Strict,
    /// Report every problem without failing
    #[default]
    Lenient,
}

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    fn nest(&mut self, prefix: String, inner: ValidationResult) {
        for error in inner.errors {
            self.add_error(format!("{}.{}", prefix, error.location), error.reason);
        }
    }
}

/// A problem found on one table row
#[derive(Debug, Clone, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub location: String,
    pub reason: String,
}

/// Validation report for a whole table
#[derive(Debug, Clone, Serialize)]
pub struct TableValidation {
    pub rows_checked: usize,
    pub issues: Vec<RowIssue>,
}

impl TableValidation {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of distinct rows with at least one issue
    pub fn invalid_rows(&self) -> usize {
        let mut rows: Vec<usize> = self.issues.iter().map(|i| i.row).collect();
        rows.dedup();
        rows.len()
    }
}

/// Validate every geometry in a table.
///
/// In strict mode the first problem is returned as an error; in lenient mode
/// all problems are collected, including rows whose WKB does not decode.
pub fn validate_table(table: &FeatureTable, mode: ValidityMode) -> Result<TableValidation> {
    let mut issues = Vec::new();

    for (row, feature) in table.rows().iter().enumerate() {
        let geometry = match feature.geometry.to_geo() {
            Ok(geometry) => geometry,
            Err(e) if mode == ValidityMode::Strict => return Err(SfError::malformed(row, e)),
            Err(e) => {
                issues.push(RowIssue { row, location: "WKB".to_string(), reason: e.to_string() });
                continue;
            }
        };

        let result = validate_geometry(&geometry);
        if result.is_valid {
            continue;
        }
        if mode == ValidityMode::Strict {
            let reason = result
                .errors
                .first()
                .map(|e| format!("{}: {}", e.location, e.reason))
                .unwrap_or_else(|| "Invalid geometry".to_string());
            return Err(SfError::InvalidGeometry { row, reason });
        }
        issues.extend(result.errors.into_iter().map(|e| RowIssue {
            row,
            location: e.location,
            reason: e.reason,
        }));
    }

    if !issues.is_empty() {
        tracing::warn!("{} geometry issues found in {} rows", issues.len(), table.len());
    }

    Ok(TableValidation { rows_checked: table.len(), issues })
}

/// Validate a geometry
pub fn validate_geometry(geometry: &geo::Geometry<f64>) -> ValidationResult {
    match geometry {
        geo::Geometry::Point(p) => validate_point(p),
        geo::Geometry::LineString(ls) => validate_linestring(ls),
        geo::Geometry::Polygon(poly) => validate_polygon(poly),
        geo::Geometry::MultiPoint(mp) => validate_multipoint(mp),
        geo::Geometry::MultiLineString(mls) => validate_multilinestring(mls),
        geo::Geometry::MultiPolygon(mp) => validate_multipolygon(mp),
        _ => {
            let mut result = ValidationResult::valid();
            result.add_error(
                "Geometry".to_string(),
                "Not a simple-feature geometry type".to_string(),
            );
            result
        }
    }
}

fn validate_point(point: &geo::Point<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    // Empty points are encoded as NaN coordinates
    if point.x().is_nan() && point.y().is_nan() {
        return result;
    }
    if !point.x().is_finite() || !point.y().is_finite() {
        result.add_error(
            format!("Point({}, {})", point.x(), point.y()),
            "Coordinates must be finite".to_string(),
        );
    }
    result
}

fn validate_linestring(linestring: &geo::LineString<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if linestring.0.len() == 1 {
        result.add_error(
            "LineString".to_string(),
            "LineString must have at least 2 points, found 1".to_string(),
        );
        return result;
    }

    for (i, coord) in linestring.0.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result
                .add_error(format!("LineString[{}]", i), "Coordinates must be finite".to_string());
        }
    }

    result
}

fn validate_ring(ring: &geo::LineString<f64>, location: String) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if ring.0.len() < 4 {
        result.add_error(
            location.clone(),
            format!("Ring must have at least 4 points, found {}", ring.0.len()),
        );
    }

    if let (Some(first), Some(last)) = (ring.0.first(), ring.0.last()) {
        if first != last {
            result.add_error(
                location.clone(),
                "Ring must be closed (first point == last point)".to_string(),
            );
        }
    }

    for (i, coord) in ring.0.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result.add_error(format!("{}[{}]", location, i), "Coordinates must be finite".to_string());
        }
    }

    result
}

fn validate_polygon(polygon: &geo::Polygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    // POLYGON EMPTY
    if polygon.exterior().0.is_empty() && polygon.interiors().is_empty() {
        return result;
    }

    for error in validate_ring(polygon.exterior(), "Polygon exterior".to_string()).errors {
        result.add_error(error.location, error.reason);
    }

    for (i, interior) in polygon.interiors().iter().enumerate() {
        for error in validate_ring(interior, format!("Polygon interior[{}]", i)).errors {
            result.add_error(error.location, error.reason);
        }
    }

    result
}

fn validate_multipoint(multipoint: &geo::MultiPoint<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    for (i, point) in multipoint.0.iter().enumerate() {
        result.nest(format!("MultiPoint[{}]", i), validate_point(point));
    }
    result
}

fn validate_multilinestring(multilinestring: &geo::MultiLineString<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    for (i, linestring) in multilinestring.0.iter().enumerate() {
        result.nest(format!("MultiLineString[{}]", i), validate_linestring(linestring));
    }
    result
}

fn validate_multipolygon(multipolygon: &geo::MultiPolygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    for (i, polygon) in multipolygon.0.iter().enumerate() {
        result.nest(format!("MultiPolygon[{}]", i), validate_polygon(polygon));
    }
    result
}
