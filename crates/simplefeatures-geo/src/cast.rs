//! Geometry casting along the simple-feature hierarchy.
//!
//! A cast is a fold over one-step decompositions
//! (MultiPolygon → Polygon → MultiLineString → LineString → MultiPoint → Point).
//! Each step turns every row into zero or more rows, duplicating attributes.
//! When a step splits any row, the rows it produced are numbered by the unit
//! they came from; the numbering of the last splitting step is attached as a
//! `_<Kind>ID` column so the multi geometries can be rebuilt later.

use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

use simplefeatures_core::error::{Result, SfError};
use simplefeatures_core::models::{Feature, FeatureTable, Geometry, GeometryKind, TableMetadata};
use simplefeatures_core::wkb::{self, WkbError};

/// Cast a table's geometries to the kind named by `to`
pub fn cast(table: &FeatureTable, to: &str, geometry_column: &str) -> Result<FeatureTable> {
    Decomposer::new().cast(table, to, geometry_column)
}

/// Name of the provenance column added when rows of `kind` are split
pub fn provenance_column(kind: GeometryKind) -> String {
    format!("_{}ID", kind)
}

/// Runs casts, optionally on a dedicated worker pool
#[derive(Debug, Default)]
pub struct Decomposer {
    pool: Option<rayon::ThreadPool>,
}

impl Decomposer {
    /// Use the global rayon pool
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Use a dedicated pool with `workers` threads (0 = global pool)
    pub fn with_workers(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Ok(Self::new());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| SfError::WorkerPool(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    /// Cast to a kind given by name, e.g. `"linestring"`
    pub fn cast(&self, table: &FeatureTable, to: &str, geometry_column: &str) -> Result<FeatureTable> {
        let target = to
            .parse::<GeometryKind>()
            .map_err(|_| unsupported_cast(table.geometry_kind(), to))?;
        self.cast_to(table, target, geometry_column)
    }

    /// Cast to a typed target kind
    pub fn cast_to(
        &self,
        table: &FeatureTable,
        to: GeometryKind,
        geometry_column: &str,
    ) -> Result<FeatureTable> {
        self.install(|| cast_table(table, to, geometry_column))
    }

    /// Run `op` on this decomposer's pool
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

fn unsupported_cast(from: Option<GeometryKind>, to: &str) -> SfError {
    SfError::UnsupportedCast {
        from: from.map(|k| k.to_string()).unwrap_or_else(|| "unknown".to_string()),
        to: to.to_string(),
        hierarchy: GeometryKind::hierarchy_string(),
    }
}

/// Geometry bytes of an intermediate row
enum Part<'a> {
    /// The input row's geometry, untouched
    Original(&'a Geometry),
    /// A member sliced out of input bytes
    Slice(&'a [u8]),
    /// Bytes built during the cast
    Owned(Vec<u8>),
}

impl<'a> Part<'a> {
    fn bytes(&self) -> &[u8] {
        match self {
            Part::Original(geometry) => geometry.wkb(),
            Part::Slice(bytes) => bytes,
            Part::Owned(bytes) => bytes,
        }
    }

    fn into_geometry(self) -> std::result::Result<Geometry, WkbError> {
        match self {
            Part::Original(geometry) => Ok(geometry.clone()),
            Part::Slice(bytes) => Geometry::from_wkb(bytes.to_vec()),
            Part::Owned(bytes) => Geometry::from_wkb(bytes),
        }
    }
}

/// Intermediate row
struct Unit<'a> {
    /// Input row index, for attributes and error reporting
    source: usize,
    part: Part<'a>,
    /// 1-based number of the unit this row came from at the last splitting step
    ordinal: usize,
}

type StepFn = for<'a, 'b> fn(&'b Part<'a>) -> std::result::Result<Vec<Part<'a>>, WkbError>;

/// One-step decomposition for geometries of kind `from`
fn step_for(from: GeometryKind) -> Option<StepFn> {
    match from {
        GeometryKind::MultiPolygon | GeometryKind::MultiLineString | GeometryKind::MultiPoint => {
            Some(split_members as StepFn)
        }
        GeometryKind::Polygon => Some(polygon_rings as StepFn),
        GeometryKind::LineString => Some(line_vertices as StepFn),
        GeometryKind::Point => None,
    }
}

fn split_members<'a>(part: &Part<'a>) -> std::result::Result<Vec<Part<'a>>, WkbError> {
    match part {
        Part::Original(geometry) => {
            let geometry: &'a Geometry = *geometry;
            Ok(wkb::split_parts(geometry.wkb())?.into_iter().map(Part::Slice).collect())
        }
        Part::Slice(bytes) => {
            let bytes: &'a [u8] = *bytes;
            Ok(wkb::split_parts(bytes)?.into_iter().map(Part::Slice).collect())
        }
        Part::Owned(bytes) => Ok(wkb::split_parts(bytes)?
            .into_iter()
            .map(|member| Part::Owned(member.to_vec()))
            .collect()),
    }
}

/// Polygon → one MultiLineString of its exterior and interior rings
fn polygon_rings<'a>(part: &Part<'a>) -> std::result::Result<Vec<Part<'a>>, WkbError> {
    let bytes = part.bytes();
    let order = wkb::read_byte_order(bytes)?;
    let polygon = match wkb::decode(bytes)? {
        geo::Geometry::Polygon(polygon) => polygon,
        _ => return Err(unexpected(GeometryKind::Polygon, bytes)),
    };

    let (exterior, interiors) = polygon.into_inner();
    let mut lines = Vec::with_capacity(1 + interiors.len());
    if !exterior.0.is_empty() || !interiors.is_empty() {
        lines.push(exterior);
    }
    lines.extend(interiors);

    let multi: geo::Geometry<f64> = geo::MultiLineString::new(lines).into();
    Ok(vec![Part::Owned(wkb::encode_with(&multi, order)?)])
}

/// LineString → one MultiPoint of its vertices
fn line_vertices<'a>(part: &Part<'a>) -> std::result::Result<Vec<Part<'a>>, WkbError> {
    let bytes = part.bytes();
    let order = wkb::read_byte_order(bytes)?;
    let line = match wkb::decode(bytes)? {
        geo::Geometry::LineString(line) => line,
        _ => return Err(unexpected(GeometryKind::LineString, bytes)),
    };

    let points: Vec<geo::Point<f64>> = line.0.into_iter().map(geo::Point::from).collect();
    let multi: geo::Geometry<f64> = geo::MultiPoint::new(points).into();
    Ok(vec![Part::Owned(wkb::encode_with(&multi, order)?)])
}

fn unexpected(expected: GeometryKind, bytes: &[u8]) -> WkbError {
    match wkb::read_kind(bytes) {
        Ok(found) => WkbError::UnexpectedMember { expected, found },
        Err(e) => e,
    }
}

/// Keep the first error by position, whatever order the workers finished in
fn first_error<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    results.into_iter().collect()
}

/// Check every row against the declared kind. With `promote`, single-part rows
/// of a multi-declared table become one-member multi geometries.
fn conform_rows(
    table: &FeatureTable,
    declared: GeometryKind,
    promote: bool,
) -> Result<Vec<Unit<'_>>> {
    let results: Vec<Result<Unit<'_>>> = table
        .rows()
        .par_iter()
        .enumerate()
        .map(|(row, feature)| {
            let found = feature.geometry.kind().map_err(|e| SfError::malformed(row, e))?;
            let part = if found == declared {
                Part::Original(&feature.geometry)
            } else if declared.is_multi() && found.multi() == declared {
                if promote {
                    let promoted = wkb::promote_to_multi(feature.geometry.wkb())
                        .map_err(|e| SfError::malformed(row, e))?;
                    Part::Owned(promoted)
                } else {
                    Part::Original(&feature.geometry)
                }
            } else {
                return Err(SfError::GeometryKindMismatch { row, expected: declared, found });
            };
            Ok(Unit { source: row, part, ordinal: row + 1 })
        })
        .collect();
    first_error(results)
}

/// Apply one decomposition step; returns the new rows and whether any row split
fn apply_step<'a>(units: Vec<Unit<'a>>, step: StepFn) -> Result<(Vec<Unit<'a>>, bool)> {
    let parts: Vec<Result<Vec<Part<'a>>>> = units
        .par_iter()
        .map(|unit| step(&unit.part).map_err(|e| SfError::malformed(unit.source, e)))
        .collect();
    let parts = first_error(parts)?;

    let split = parts.iter().any(|p| p.len() > 1);
    let mut next = Vec::with_capacity(parts.iter().map(Vec::len).sum());
    let mut ordinal = 0;

    for (unit, parts) in units.into_iter().zip(parts) {
        if parts.is_empty() {
            continue;
        }
        ordinal += 1;
        let ordinal = if split { ordinal } else { unit.ordinal };
        next.extend(parts.into_iter().map(|part| Unit { source: unit.source, part, ordinal }));
    }

    Ok((next, split))
}

fn cast_table(table: &FeatureTable, to: GeometryKind, geometry_column: &str) -> Result<FeatureTable> {
    if geometry_column != table.geometry_column() {
        return Err(SfError::GeometryColumnNotFound {
            column: geometry_column.to_string(),
            available: table.geometry_column().to_string(),
        });
    }

    let from = table.geometry_kind().ok_or_else(|| SfError::MissingMetadata {
        key: "geometry_kind".to_string(),
    })?;
    let path = from.cast_path(to).ok_or_else(|| unsupported_cast(Some(from), to.as_str()))?;

    if path.is_empty() {
        conform_rows(table, from, false)?;
        info!("Cast {} rows from {} to {}: unchanged", table.len(), from, to);
        return Ok(table.clone());
    }

    let mut units = conform_rows(table, from, true)?;
    let mut provenance = None;

    for (step_from, step_to) in path {
        let step = step_for(step_from)
            .ok_or_else(|| unsupported_cast(Some(step_from), step_to.as_str()))?;
        let rows_in = units.len();
        let (next, split) = apply_step(units, step)?;
        debug!("Cast step {} -> {}: {} rows in, {} rows out", step_from, step_to, rows_in, next.len());

        if split {
            provenance = Some(step_from);
        }
        units = next;
    }

    let ordinals: Vec<Value> = units.iter().map(|u| Value::from(u.ordinal)).collect();
    let rows: Vec<Result<Feature>> = units
        .into_par_iter()
        .map(|unit| {
            let source = unit.source;
            let geometry = unit.part.into_geometry().map_err(|e| SfError::malformed(source, e))?;
            Ok(Feature::new(geometry, table.rows()[source].attributes.clone()))
        })
        .collect();
    let rows = first_error(rows)?;

    let metadata = TableMetadata { geometry_kind: Some(to), ..table.metadata().clone() };
    let mut output =
        FeatureTable::new(table.geometry_column(), table.columns().to_vec(), rows, metadata)?;

    if let Some(kind) = provenance {
        output.set_column(provenance_column(kind), ordinals)?;
    }

    info!("Cast {} rows from {} to {}: {} rows", table.len(), from, to, output.len());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;
    use serde_json::json;
    use simplefeatures_core::models::Crs;

    fn table(kind: GeometryKind, wkts: &[&str]) -> FeatureTable {
        let rows = wkts
            .iter()
            .enumerate()
            .map(|(i, wkt)| Feature::new(Geometry::from_wkt(wkt).unwrap(), vec![json!(i as i64)]))
            .collect();
        FeatureTable::new(
            "geom",
            vec!["lyr.1".to_string()],
            rows,
            TableMetadata {
                crs: Some(Crs::new(6346, "NAD83(2011) / UTM zone 17N")),
                geometry_kind: Some(kind),
                description: Some("description".to_string()),
            },
        )
        .unwrap()
    }

    fn kinds(table: &FeatureTable) -> Vec<GeometryKind> {
        table.geometries().map(|g| g.kind().unwrap()).collect()
    }

    const HOLED: &str = "POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,4 2,4 4,2 2))";
    const SIMPLE: &str = "POLYGON((20 20,30 20,30 30,20 20))";

    #[test]
    fn test_polygon_with_hole_to_linestring() {
        let input = table(GeometryKind::Polygon, &[HOLED]);
        let output = cast(&input, "linestring", "geom").unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(kinds(&output), vec![GeometryKind::LineString; 2]);
        assert_eq!(output.geometry_kind(), Some(GeometryKind::LineString));
        assert_eq!(output.columns(), &["lyr.1".to_string(), "_MultiLineStringID".to_string()]);
        assert_eq!(output.column("_MultiLineStringID").unwrap(), vec![&json!(1), &json!(1)]);
        assert_eq!(
            output.rows()[1].geometry.to_geo().unwrap(),
            geo::Geometry::LineString(line_string![
                (x: 2.0, y: 2.0),
                (x: 4.0, y: 2.0),
                (x: 4.0, y: 4.0),
                (x: 2.0, y: 2.0)
            ])
        );
    }

    #[test]
    fn test_simple_polygon_to_multilinestring_adds_no_column() {
        let input = table(GeometryKind::Polygon, &[SIMPLE]);
        let output = cast(&input, "multilinestring", "geom").unwrap();

        assert_eq!(output.len(), 1);
        assert_eq!(kinds(&output), vec![GeometryKind::MultiLineString]);
        assert_eq!(output.columns(), &["lyr.1".to_string()]);
        assert_eq!(output.crs(), input.crs());
        assert_eq!(output.description(), Some("description"));
    }

    #[test]
    fn test_points_cannot_become_polygons() {
        let input = table(GeometryKind::Point, &["POINT(1 1)"]);
        let err = cast(&input, "polygon", "geom").unwrap_err();
        match err {
            SfError::UnsupportedCast { from, to, hierarchy } => {
                assert_eq!(from, "Point");
                assert_eq!(to, "polygon");
                assert!(hierarchy.starts_with("multipolygon > polygon"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        let input = table(GeometryKind::Point, &["POINT(1 1)"]);
        assert!(matches!(
            cast(&input, "circle", "geom"),
            Err(SfError::UnsupportedCast { .. })
        ));
    }

    #[test]
    fn test_cast_to_same_kind_is_identity() {
        let input = table(GeometryKind::Polygon, &[HOLED, SIMPLE]);
        let output = cast(&input, "polygon", "geom").unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_provenance_numbers_the_last_split() {
        // Two multipolygons; the first holds a holed polygon and a simple one
        let input = table(
            GeometryKind::MultiPolygon,
            &[
                "MULTIPOLYGON(((0 0,10 0,10 10,0 10,0 0),(2 2,4 2,4 4,2 2)),((20 20,30 20,30 30,20 20)))",
                "MULTIPOLYGON(((40 40,50 40,50 50,40 40)))",
            ],
        );
        let output = cast(&input, "linestring", "geom").unwrap();

        // 2 + 1 lines from row 0, 1 line from row 1
        assert_eq!(output.len(), 4);
        assert_eq!(
            output.column("_MultiLineStringID").unwrap(),
            vec![&json!(1), &json!(1), &json!(2), &json!(3)]
        );
        assert_eq!(
            output.column("lyr.1").unwrap(),
            vec![&json!(0), &json!(0), &json!(0), &json!(1)]
        );
    }

    #[test]
    fn test_multipolygon_to_polygon() {
        let input = table(
            GeometryKind::MultiPolygon,
            &["MULTIPOLYGON(((0 0,1 0,1 1,0 0)),((5 5,6 5,6 6,5 5)))", "MULTIPOLYGON(((8 8,9 8,9 9,8 8)))"],
        );
        let output = cast(&input, "polygon", "geom").unwrap();

        assert_eq!(output.len(), 3);
        assert_eq!(
            output.column("_MultiPolygonID").unwrap(),
            vec![&json!(1), &json!(1), &json!(2)]
        );
    }

    #[test]
    fn test_single_parts_are_promoted() {
        let input = table(GeometryKind::MultiPoint, &["POINT(1 2)", "MULTIPOINT((3 4),(5 6))"]);
        let output = cast(&input, "point", "geom").unwrap();

        assert_eq!(output.len(), 3);
        assert_eq!(output.rows()[0].geometry.wkb(), input.rows()[0].geometry.wkb());
        assert_eq!(
            output.column("_MultiPointID").unwrap(),
            vec![&json!(1), &json!(2), &json!(2)]
        );
    }

    #[test]
    fn test_cast_to_declared_multi_keeps_single_parts() {
        let input = table(GeometryKind::MultiPoint, &["POINT(1 2)", "MULTIPOINT((3 4),(5 6))"]);
        let output = cast(&input, "multipoint", "geom").unwrap();

        assert_eq!(output, input);
        assert_eq!(kinds(&output), vec![GeometryKind::Point, GeometryKind::MultiPoint]);
    }

    #[test]
    fn test_cast_to_declared_kind_still_checks_rows() {
        let input = table(GeometryKind::MultiPoint, &["POINT(1 2)", "LINESTRING(0 0,1 1)"]);
        assert!(matches!(
            cast(&input, "multipoint", "geom"),
            Err(SfError::GeometryKindMismatch { row: 1, .. })
        ));
    }

    #[test]
    fn test_linestring_to_point() {
        let input = table(GeometryKind::LineString, &["LINESTRING(0 0,1 1,2 2)"]);

        let multi = cast(&input, "multipoint", "geom").unwrap();
        assert_eq!(multi.len(), 1);
        assert_eq!(kinds(&multi), vec![GeometryKind::MultiPoint]);

        let points = cast(&input, "point", "geom").unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(
            points.rows()[2].geometry.to_geo().unwrap(),
            geo::Geometry::Point(geo::Point::new(2.0, 2.0))
        );
    }

    #[test]
    fn test_kind_mismatch_reports_row() {
        let input = table(GeometryKind::Polygon, &[SIMPLE, "LINESTRING(0 0,1 1)"]);
        match cast(&input, "linestring", "geom").unwrap_err() {
            SfError::GeometryKindMismatch { row, expected, found } => {
                assert_eq!(row, 1);
                assert_eq!(expected, GeometryKind::Polygon);
                assert_eq!(found, GeometryKind::LineString);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_row_aborts_cast() {
        let mut input = table(GeometryKind::MultiPoint, &["MULTIPOINT((0 0),(1 1))"]);
        // Valid header, truncated body
        let truncated = input.rows()[0].geometry.wkb()[..20].to_vec();
        input
            .push(Feature::new(Geometry::from_wkb_unchecked(truncated), vec![json!(9)]))
            .unwrap();

        match cast(&input, "point", "geom").unwrap_err() {
            SfError::MalformedGeometry { row, .. } => assert_eq!(row, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lowest_failing_row_is_reported() {
        let mut input = table(GeometryKind::MultiPoint, &["MULTIPOINT((0 0),(1 1))"]);
        let truncated = input.rows()[0].geometry.wkb()[..20].to_vec();
        for i in 0..64 {
            input
                .push(Feature::new(Geometry::from_wkb_unchecked(truncated.clone()), vec![json!(i)]))
                .unwrap();
        }

        let decomposer = Decomposer::with_workers(4).unwrap();
        for _ in 0..8 {
            match decomposer.cast_to(&input, GeometryKind::Point, "geom").unwrap_err() {
                SfError::MalformedGeometry { row, .. } => assert_eq!(row, 1),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_wrong_geometry_column() {
        let input = table(GeometryKind::Point, &["POINT(1 1)"]);
        assert!(matches!(
            cast(&input, "point", "geometry"),
            Err(SfError::GeometryColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_declared_kind() {
        let input = table(GeometryKind::Point, &["POINT(1 1)"])
            .with_metadata(TableMetadata::default());
        assert!(matches!(
            cast(&input, "point", "geom"),
            Err(SfError::MissingMetadata { .. })
        ));
    }

    #[test]
    fn test_dedicated_worker_pool() {
        let input = table(GeometryKind::Polygon, &[HOLED, SIMPLE, HOLED]);
        let decomposer = Decomposer::with_workers(2).unwrap();
        let output = decomposer.cast_to(&input, GeometryKind::LineString, "geom").unwrap();
        assert_eq!(output.len(), 5);
        assert_eq!(output, cast(&input, "linestring", "geom").unwrap());
    }

    #[test]
    fn test_big_endian_members_keep_byte_order() {
        let multi: geo::Geometry<f64> =
            geo::MultiPoint::new(vec![geo::Point::new(1.0, 2.0), geo::Point::new(3.0, 4.0)]).into();
        let bytes = wkb::encode_with(&multi, wkb::ByteOrder::BigEndian).unwrap();
        let input = FeatureTable::new(
            "geom",
            vec![],
            vec![Feature::new(Geometry::from_wkb(bytes).unwrap(), vec![])],
            TableMetadata { geometry_kind: Some(GeometryKind::MultiPoint), ..Default::default() },
        )
        .unwrap();

        let output = cast(&input, "point", "geom").unwrap();
        for feature in output.rows() {
            assert_eq!(feature.geometry.wkb()[0], 0);
        }
    }
}
