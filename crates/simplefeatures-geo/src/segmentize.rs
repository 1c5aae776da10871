//! Segmentizing: insert vertices so no segment exceeds a maximum length

use geo::{Densify, Distance, Euclidean, LinesIter};
use rayon::prelude::*;

use simplefeatures_core::error::{Result, SfError};
use simplefeatures_core::models::{FeatureTable, Geometry};
use simplefeatures_core::wkb;

/// Upper bound on the segments one geometry may be split into
pub const MAX_SEGMENTS_PER_GEOMETRY: f64 = 1_000_000.0;

/// Densify every line and ring in the table so that no segment is longer than
/// `max_length` (planar distance, in CRS units). Points pass through unchanged.
pub fn segmentize(table: &FeatureTable, max_length: f64) -> Result<FeatureTable> {
    if !max_length.is_finite() || max_length <= 0.0 {
        return Err(SfError::InvalidArgument {
            name: "max_length".to_string(),
            reason: format!("must be a positive finite number, got {}", max_length),
        });
    }

    let results: Vec<Result<Geometry>> = table
        .rows()
        .par_iter()
        .enumerate()
        .map(|(row, feature)| segmentize_row(&feature.geometry, max_length, row))
        .collect();
    // Sequential pass so the lowest failing row is the one reported
    let geometries = results.into_iter().collect::<Result<Vec<_>>>()?;

    tracing::debug!("Segmentized {} rows with max length {}", geometries.len(), max_length);
    table.with_geometries(geometries)
}

fn segmentize_row(geometry: &Geometry, max_length: f64, row: usize) -> Result<Geometry> {
    let bytes = geometry.wkb();
    let decoded = wkb::decode(bytes).map_err(|e| SfError::malformed(row, e))?;

    if matches!(decoded, geo::Geometry::Point(_) | geo::Geometry::MultiPoint(_)) {
        return Ok(geometry.clone());
    }

    let order = wkb::read_byte_order(bytes).map_err(|e| SfError::malformed(row, e))?;
    let densified = segmentize_geometry(&decoded, max_length).map_err(|e| match e {
        SfError::InvalidGeometry { reason, .. } => SfError::InvalidGeometry { row, reason },
        other => other,
    })?;
    let encoded = wkb::encode_with(&densified, order).map_err(|e| SfError::malformed(row, e))?;
    Geometry::from_wkb(encoded).map_err(|e| SfError::malformed(row, e))
}

/// Densify a single geometry.
///
/// Fails when a segment length is not finite, or when the geometry would need
/// more than [`MAX_SEGMENTS_PER_GEOMETRY`] segments. Geometry errors carry row 0.
pub fn segmentize_geometry(
    geometry: &geo::Geometry<f64>,
    max_length: f64,
) -> Result<geo::Geometry<f64>> {
    Ok(match geometry {
        geo::Geometry::LineString(ls) => {
            check_segment_count(ls, max_length)?;
            Euclidean.densify(ls, max_length).into()
        }
        geo::Geometry::Polygon(p) => {
            check_segment_count(p, max_length)?;
            Euclidean.densify(p, max_length).into()
        }
        geo::Geometry::MultiLineString(mls) => {
            check_segment_count(mls, max_length)?;
            Euclidean.densify(mls, max_length).into()
        }
        geo::Geometry::MultiPolygon(mp) => {
            check_segment_count(mp, max_length)?;
            Euclidean.densify(mp, max_length).into()
        }
        other => other.clone(),
    })
}

fn check_segment_count<'a, G>(geometry: &'a G, max_length: f64) -> Result<()>
where
    G: LinesIter<'a, Scalar = f64>,
{
    let mut total = 0.0;
    for line in geometry.lines_iter() {
        let length = Euclidean.distance(line.start_point(), line.end_point());
        if !length.is_finite() {
            return Err(SfError::InvalidGeometry {
                row: 0,
                reason: "segment length is not finite".to_string(),
            });
        }
        total += (length / max_length).ceil().max(1.0);
        if total > MAX_SEGMENTS_PER_GEOMETRY {
            return Err(SfError::InvalidArgument {
                name: "max_length".to_string(),
                reason: format!(
                    "{} would split a geometry into more than {} segments",
                    max_length, MAX_SEGMENTS_PER_GEOMETRY
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;
    use serde_json::json;
    use simplefeatures_core::models::{Feature, GeometryKind, TableMetadata};

    fn max_segment(line: &LineString<f64>) -> f64 {
        line.0
            .windows(2)
            .map(|s| (s[1].x - s[0].x).hypot(s[1].y - s[0].y))
            .fold(0.0, f64::max)
    }

    fn densify(line: &LineString<f64>, max_length: f64) -> LineString<f64> {
        match segmentize_geometry(&line.clone().into(), max_length).unwrap() {
            geo::Geometry::LineString(ls) => ls,
            other => panic!("expected linestring, got {:?}", other),
        }
    }

    fn line_table(wkt: &str) -> FeatureTable {
        FeatureTable::new(
            "geom",
            vec![],
            vec![Feature::new(Geometry::from_wkt(wkt).unwrap(), vec![])],
            TableMetadata { geometry_kind: Some(GeometryKind::LineString), ..Default::default() },
        )
        .unwrap()
    }

    #[test]
    fn test_densify_line() {
        let line = LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]);
        let dense = densify(&line, 3.0);

        // ceil(10 / 3) = 4 pieces
        assert_eq!(dense.0.len(), 5);
        assert!(max_segment(&dense) <= 3.0);
        assert_eq!(dense.0.first(), line.0.first());
        assert_eq!(dense.0.last(), line.0.last());
    }

    #[test]
    fn test_short_segments_untouched() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 1.0)]);
        assert_eq!(densify(&line, 5.0), line);
    }

    #[test]
    fn test_polygon_rings_are_densified() {
        let geometry = Geometry::from_wkt("POLYGON((0 0,4 0,4 4,0 4,0 0))").unwrap();
        let table = FeatureTable::new(
            "geom",
            vec!["id".to_string()],
            vec![Feature::new(geometry, vec![json!(1)])],
            TableMetadata { geometry_kind: Some(GeometryKind::Polygon), ..Default::default() },
        )
        .unwrap();

        let output = segmentize(&table, 1.0).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output.rows()[0].attributes, vec![json!(1)]);
        match output.rows()[0].geometry.to_geo().unwrap() {
            geo::Geometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 17);
                assert!(max_segment(p.exterior()) <= 1.0);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_points_pass_through() {
        let geometry = Geometry::from_wkt("MULTIPOINT((0 0),(100 100))").unwrap();
        let table =
            FeatureTable::new("geom", vec![], vec![Feature::new(geometry.clone(), vec![])], TableMetadata::default())
                .unwrap();
        let output = segmentize(&table, 1.0).unwrap();
        assert_eq!(output.rows()[0].geometry, geometry);
    }

    #[test]
    fn test_invalid_max_length() {
        let table = FeatureTable::empty("geom", vec![]).unwrap();
        assert!(matches!(segmentize(&table, 0.0), Err(SfError::InvalidArgument { .. })));
        assert!(matches!(segmentize(&table, f64::NAN), Err(SfError::InvalidArgument { .. })));
    }

    #[test]
    fn test_tiny_max_length_is_rejected() {
        let table = line_table("LINESTRING(0 0,1 0)");
        assert!(matches!(
            segmentize(&table, 1e-300),
            Err(SfError::InvalidArgument { ref name, .. }) if name == "max_length"
        ));
    }

    #[test]
    fn test_segment_limit_sums_over_segments() {
        // Ten unit segments: about 1e5 pieces at 1e-4, about 1e7 at 1e-6
        let line = LineString::from((0..=10).map(|i| (i as f64, 0.0)).collect::<Vec<_>>());
        assert!(segmentize_geometry(&line.clone().into(), 1e-4).is_ok());
        assert!(matches!(
            segmentize_geometry(&line.into(), 1e-6),
            Err(SfError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_infinite_coordinates_report_row() {
        let mut table = line_table("LINESTRING(0 0,1 0)");
        let line: geo::Geometry<f64> =
            LineString::from(vec![(0.0, 0.0), (f64::INFINITY, 0.0)]).into();
        table.push(Feature::new(Geometry::from_geo(&line).unwrap(), vec![])).unwrap();

        assert!(matches!(
            segmentize(&table, 1.0),
            Err(SfError::InvalidGeometry { row: 1, .. })
        ));
    }
}
