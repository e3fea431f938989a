//! End-to-end runs over GeoJSON sources: parse, check, summarize.

use geoqa_checks::offpoint;
use geoqa_checks::revision;
use geoqa_checks::worldfile::{self, WorldFileOptions, WorldFileParams};
use geoqa_core::io::parse_geojson;
use geoqa_core::{Error, Hooks};
use std::sync::atomic::{AtomicUsize, Ordering};

const POLYGONS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[
                [106.80, -6.20], [106.90, -6.20], [106.90, -6.10],
                [106.80, -6.10], [106.80, -6.20]
            ]]},
            "properties": {"idsls": "3201010001"}
        },
        {
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[
                [106.90, -6.20], [107.00, -6.20], [107.00, -6.10],
                [106.90, -6.10], [106.90, -6.20]
            ]]},
            "properties": {"idsls": "3201010002"}
        }
    ]
}"#;

const POINTS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [106.85, -6.15]},
            "properties": {"idsls": "3201010001", "wid": "W001", "nama": "Blok A"}
        },
        {
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [106.95, -6.15]},
            "properties": {"idsls": "3201010001", "wid": "W002", "nama": "Blok B"}
        },
        {
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [106.85, -6.15]},
            "properties": {"idsls": "3201010002", "wid": "W003", "nama": "Blok C"}
        }
    ]
}"#;

const OLD_POLYGONS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[
                [106.80, -6.20], [106.88, -6.20], [106.88, -6.10],
                [106.80, -6.10], [106.80, -6.20]
            ]]},
            "properties": {"idsls": "3201010001"}
        }
    ]
}"#;

#[test]
fn test_offpoint_end_to_end() {
    let points = parse_geojson(POINTS).unwrap();
    let polygons = parse_geojson(POLYGONS).unwrap();

    let outcome =
        offpoint::find_mismatches(&points, &polygons, "idsls", "wid", &Hooks::default()).unwrap();
    assert_eq!(outcome.mismatches.len(), 2);
    assert!(outcome.skipped.is_empty());

    // W002 claims ...0001 but sits in ...0002; W003 the reverse
    let by_point: Vec<(&str, &str, &str)> = outcome
        .mismatches
        .iter()
        .map(|m| {
            (
                m.point_id.as_str(),
                m.expected_polygon_id.as_str(),
                m.actual_polygon_id.as_str(),
            )
        })
        .collect();
    assert!(by_point.contains(&("W002", "3201010001", "3201010002")));
    assert!(by_point.contains(&("W003", "3201010002", "3201010001")));

    // Pass-through attributes survive for the report layer
    let w002 = outcome
        .mismatches
        .iter()
        .find(|m| m.point_id == "W002")
        .unwrap();
    assert_eq!(w002.attributes.get("nama").map(String::as_str), Some("Blok B"));

    let summary = offpoint::summarize(&outcome.mismatches);
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].id, "3201010001");
    assert_eq!(summary[0].count, 1);
    assert_eq!(summary[0].list_id, "W002");
}

#[test]
fn test_revision_end_to_end() {
    let new_polygons = parse_geojson(POLYGONS).unwrap();
    let old_polygons = parse_geojson(OLD_POLYGONS).unwrap();

    let outcome = revision::compare(
        &new_polygons,
        &old_polygons,
        "idsls",
        0.5,
        0.05,
        &Hooks::default(),
    )
    .unwrap();

    // Old ...0001 covers 0.08° of the new 0.10° strip: drift ratio
    // 1 - 0.08/0.09 ≈ 0.111 clears the 0.05 threshold
    assert_eq!(outcome.drifts.len(), 1);
    assert_eq!(outcome.drifts[0].id, "3201010001");
    assert!(outcome.drifts[0].change_ratio > 0.05);

    // The old strip ends at 106.88 and never reaches new ...0002
    assert!(outcome.overlaps.is_empty());
}

#[test]
fn test_worldfile_end_to_end() {
    let polygons = parse_geojson(POLYGONS).unwrap();

    let outcome =
        worldfile::generate(&polygons, &WorldFileOptions::default(), &Hooks::default()).unwrap();
    assert_eq!(outcome.records.len(), 2);

    for record in &outcome.records {
        // GeoJSON is WGS84 already, so the pipeline stays in degrees
        let (xmin, ymin, xmax, ymax) = record.bounds;
        assert!(xmin < 106.80 && xmax > 106.90);
        assert!(ymin < -6.20 && ymax > -6.10);
        assert!(record.params.y_scale < 0.0);

        let text = record.params.contents();
        assert_eq!(text.lines().count(), 6);
        assert_eq!(
            WorldFileParams::file_name(&record.id, "jgw"),
            format!("{}_WS.jgw", record.id)
        );
    }
}

#[test]
fn test_progress_hooks_fire_across_checks() {
    let points = parse_geojson(POINTS).unwrap();
    let polygons = parse_geojson(POLYGONS).unwrap();

    let calls = AtomicUsize::new(0);
    let on_progress = |_current: usize, _total: usize| {
        calls.fetch_add(1, Ordering::SeqCst);
    };
    let hooks = Hooks::new().with_progress(&on_progress);

    offpoint::find_mismatches(&points, &polygons, "idsls", "wid", &hooks).unwrap();
    let after_offpoint = calls.load(Ordering::SeqCst);
    assert!(after_offpoint > 0);

    worldfile::generate(&polygons, &WorldFileOptions::default(), &hooks).unwrap();
    assert!(calls.load(Ordering::SeqCst) > after_offpoint);
}

#[test]
fn test_cancellation_stops_batch() {
    let points = parse_geojson(POINTS).unwrap();
    let polygons = parse_geojson(POLYGONS).unwrap();

    let cancel = || true;
    let hooks = Hooks::new().with_cancel(&cancel);

    let err = offpoint::find_mismatches(&points, &polygons, "idsls", "wid", &hooks).unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    let err = worldfile::generate(&polygons, &WorldFileOptions::default(), &hooks).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[test]
fn test_schema_error_in_one_check_leaves_siblings_usable() {
    let points = parse_geojson(POINTS).unwrap();
    let polygons = parse_geojson(POLYGONS).unwrap();

    // Revision comparison against a vintage missing the id column fails
    let old = parse_geojson(
        r#"{
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[
                [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]
            ]]},
            "properties": {"kode": "x"}
        }"#,
    )
    .unwrap();
    let err =
        revision::compare(&polygons, &old, "idsls", 0.5, 0.05, &Hooks::default()).unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));

    // The off-point check still runs on the same inputs
    let outcome =
        offpoint::find_mismatches(&points, &polygons, "idsls", "wid", &Hooks::default()).unwrap();
    assert_eq!(outcome.mismatches.len(), 2);
}
