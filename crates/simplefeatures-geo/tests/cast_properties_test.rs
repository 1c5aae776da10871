//! Property tests for geometry casting
//!
//! These tests verify the row-count law, provenance numbering, order
//! preservation and idempotence of casts over generated multipolygon tables.

use proptest::prelude::*;
use serde_json::{json, Value};
use simplefeatures_core::models::{Feature, FeatureTable, Geometry, GeometryKind, TableMetadata};
use simplefeatures_geo::{cast, provenance_column};

/// WKT for a square polygon at `(ox, oy)` with `holes` triangular holes
fn polygon_wkt(ox: f64, oy: f64, holes: usize) -> String {
    let mut rings = vec![format!(
        "({} {},{} {},{} {},{} {},{} {})",
        ox,
        oy,
        ox + 100.0,
        oy,
        ox + 100.0,
        oy + 100.0,
        ox,
        oy + 100.0,
        ox,
        oy
    )];
    for h in 0..holes {
        let hx = ox + 10.0 + 20.0 * h as f64;
        let hy = oy + 10.0;
        rings.push(format!(
            "({} {},{} {},{} {},{} {})",
            hx,
            hy,
            hx + 5.0,
            hy,
            hx + 5.0,
            hy + 5.0,
            hx,
            hy
        ));
    }
    format!("({})", rings.join(","))
}

/// One row per entry; each entry lists the hole count of every polygon part
fn multipolygon_table(rows: &[Vec<usize>]) -> FeatureTable {
    let features = rows
        .iter()
        .enumerate()
        .map(|(i, parts)| {
            let polygons: Vec<String> = parts
                .iter()
                .enumerate()
                .map(|(j, holes)| polygon_wkt(i as f64 * 1000.0, j as f64 * 200.0, *holes))
                .collect();
            let wkt = format!("MULTIPOLYGON({})", polygons.join(","));
            Feature::new(Geometry::from_wkt(&wkt).unwrap(), vec![json!(i), json!(format!("row-{}", i))])
        })
        .collect();

    FeatureTable::new(
        "geom",
        vec!["row".to_string(), "label".to_string()],
        features,
        TableMetadata { geometry_kind: Some(GeometryKind::MultiPolygon), ..Default::default() },
    )
    .unwrap()
}

fn rows_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0usize..3, 1..4), 0..12)
}

proptest! {
    #[test]
    fn prop_linestring_row_count(rows in rows_strategy()) {
        let table = multipolygon_table(&rows);
        let output = cast(&table, "linestring", "geom").unwrap();

        let expected: usize = rows.iter().flatten().map(|holes| 1 + holes).sum();
        prop_assert_eq!(output.len(), expected);
        prop_assert!(output.len() >= table.len());
        prop_assert_eq!(output.geometry_kind(), Some(GeometryKind::LineString));
        for geometry in output.geometries() {
            prop_assert_eq!(geometry.kind().unwrap(), GeometryKind::LineString);
        }
    }

    #[test]
    fn prop_polygon_row_count(rows in rows_strategy()) {
        let table = multipolygon_table(&rows);
        let output = cast(&table, "polygon", "geom").unwrap();

        let expected: usize = rows.iter().map(Vec::len).sum();
        prop_assert_eq!(output.len(), expected);
    }

    #[test]
    fn prop_order_is_preserved(rows in rows_strategy()) {
        let table = multipolygon_table(&rows);
        let output = cast(&table, "linestring", "geom").unwrap();

        let sources: Vec<u64> = output
            .column("row")
            .unwrap()
            .into_iter()
            .map(|v| v.as_u64().unwrap())
            .collect();
        prop_assert!(sources.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_provenance_is_contiguous(rows in rows_strategy()) {
        let table = multipolygon_table(&rows);
        let output = cast(&table, "linestring", "geom").unwrap();

        let any_holes = rows.iter().flatten().any(|h| *h > 0);
        let any_multi = rows.iter().any(|parts| parts.len() > 1);

        let column = if any_holes {
            Some(provenance_column(GeometryKind::MultiLineString))
        } else if any_multi {
            Some(provenance_column(GeometryKind::MultiPolygon))
        } else {
            None
        };

        match column {
            None => prop_assert_eq!(output.columns().len(), 2),
            Some(name) => {
                let ids: Vec<u64> = output
                    .column(&name)
                    .unwrap()
                    .into_iter()
                    .map(|v| v.as_u64().unwrap())
                    .collect();
                prop_assert_eq!(ids.first().copied(), Some(1));
                prop_assert!(ids.windows(2).all(|w| w[1] == w[0] || w[1] == w[0] + 1));

                let units = if any_holes {
                    rows.iter().map(Vec::len).sum::<usize>()
                } else {
                    rows.len()
                };
                prop_assert_eq!(ids.last().copied(), Some(units as u64));
            }
        }
    }

    #[test]
    fn prop_cast_to_declared_kind_is_identity(rows in rows_strategy()) {
        let table = multipolygon_table(&rows);
        let output = cast(&table, "multipolygon", "geom").unwrap();
        prop_assert_eq!(output, table);
    }
}

#[test]
fn test_input_table_is_untouched() {
    let table = multipolygon_table(&[vec![2, 0], vec![1]]);
    let before = table.clone();
    let _ = cast(&table, "point", "geom").unwrap();
    assert_eq!(table, before);
}

#[test]
fn test_attributes_are_duplicated_verbatim() {
    let table = multipolygon_table(&[vec![1]]);
    let output = cast(&table, "linestring", "geom").unwrap();

    assert_eq!(output.len(), 2);
    for feature in output.rows() {
        assert_eq!(&feature.attributes[..2], &[json!(0), json!("row-0")]);
        assert_eq!(feature.attributes[2], Value::from(1));
    }
}

#[test]
fn test_empty_multipolygon_drops_row() {
    let mut table = multipolygon_table(&[vec![0]]);
    table
        .push(Feature::new(
            Geometry::from_wkt("MULTIPOLYGON EMPTY").unwrap(),
            vec![json!(1), json!("row-1")],
        ))
        .unwrap();
    let pair = format!("MULTIPOLYGON({},{})", polygon_wkt(0.0, 0.0, 0), polygon_wkt(500.0, 0.0, 0));
    table
        .push(Feature::new(Geometry::from_wkt(&pair).unwrap(), vec![json!(2), json!("row-2")]))
        .unwrap();

    let output = cast(&table, "polygon", "geom").unwrap();
    assert_eq!(output.len(), 3);
    assert_eq!(
        output.column("_MultiPolygonID").unwrap(),
        vec![&json!(1), &json!(2), &json!(2)]
    );
    assert_eq!(output.column("row").unwrap(), vec![&json!(0), &json!(2), &json!(2)]);
}

#[test]
fn test_multipolygon_all_the_way_to_points() {
    // One square without holes: 5 ring vertices
    let table = multipolygon_table(&[vec![0]]);
    let output = cast(&table, "point", "geom").unwrap();

    assert_eq!(output.len(), 5);
    assert_eq!(output.geometry_kind(), Some(GeometryKind::Point));
    assert_eq!(
        output.column("_MultiPointID").unwrap(),
        vec![&json!(1); 5]
    );
}
