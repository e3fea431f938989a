//! Off-point detection
//!
//! Finds enumeration points whose recorded administrative code disagrees
//! with the polygon that geometrically contains them, then aggregates the
//! findings into the per-area summary the field teams receive.

use geo::Contains;
use geo_types::{Geometry, Point};
use geoqa_core::{Check, Feature, FeatureCollection, FeatureSkip, Hooks, Result, Transform};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A point whose stated area code differs from the containing polygon's.
#[derive(Debug, Clone, Serialize)]
pub struct JoinMismatch {
    /// The point's own identifier (from the auxiliary id column, e.g. `wid`)
    pub point_id: String,
    /// The area code the point claims to belong to
    pub expected_polygon_id: String,
    /// The code of the polygon that actually contains it, `""` if none does
    pub actual_polygon_id: String,
    /// Remaining point attributes, passed through for reporting
    pub attributes: HashMap<String, String>,
}

/// One row of the off-point report: a claimed area code with the points
/// wrongly assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffPointSummary {
    pub id: String,
    pub count: usize,
    /// Comma-joined point identifiers
    pub list_id: String,
}

/// Result of an off-point run: findings plus skipped features.
#[derive(Debug, Default)]
pub struct OffPointOutcome {
    pub mismatches: Vec<JoinMismatch>,
    pub skipped: Vec<FeatureSkip>,
}

/// Find points located outside the polygon matching their stated id.
///
/// Points are reprojected onto the polygon CRS when the two differ. Each
/// point is tested against polygons in ascending-id order, so when survey
/// polygons accidentally overlap, the lexicographically smallest id wins
/// deterministically.
///
/// # Arguments
/// * `points` - Enumeration point collection
/// * `polygons` - Administrative boundary collection
/// * `id_field` - Area-code column present in both collections
/// * `point_id_field` - Auxiliary column identifying individual points
///
/// # Returns
/// Mismatches plus a side channel of skipped features
pub fn find_mismatches(
    points: &FeatureCollection,
    polygons: &FeatureCollection,
    id_field: &str,
    point_id_field: &str,
    hooks: &Hooks,
) -> Result<OffPointOutcome> {
    points.require_field(id_field, "point")?;
    polygons.require_field(id_field, "polygon")?;

    let transform = Transform::between(points.crs(), polygons.crs())?;

    log::info!(
        "Checking point-polygon consistency: {} points against {} polygons",
        points.len(),
        polygons.len()
    );

    let mut outcome = OffPointOutcome::default();

    // Polygons sorted by id: first containing hit is the smallest id.
    let mut areas: Vec<(&str, &Geometry<f64>)> = Vec::with_capacity(polygons.len());
    for feature in polygons.iter() {
        let id = feature.attribute(id_field).unwrap_or_default();
        match &feature.geometry {
            Some(geom @ (Geometry::Polygon(_) | Geometry::MultiPolygon(_))) => {
                areas.push((id, geom));
            }
            Some(_) => {
                outcome
                    .skipped
                    .push(FeatureSkip::new(id, "non-polygon geometry in polygon file"));
            }
            None => {
                outcome
                    .skipped
                    .push(FeatureSkip::new(id, "empty geometry in polygon file"));
            }
        }
    }
    areas.sort_by(|a, b| a.0.cmp(b.0));

    let total = points.len();
    hooks.progress(0, total);

    for (index, feature) in points.iter().enumerate() {
        hooks.check_cancelled()?;

        let expected = feature.attribute(id_field).unwrap_or_default().to_string();
        let Some(point) = point_of(feature) else {
            outcome.skipped.push(FeatureSkip::new(
                if expected.is_empty() {
                    format!("#{index}")
                } else {
                    expected.clone()
                },
                "point feature without point geometry",
            ));
            hooks.progress(index + 1, total);
            continue;
        };

        let (x, y) = transform.apply(point.x(), point.y());
        let point = Point::new(x, y);

        let actual = areas
            .iter()
            .find(|(_, geom)| geom.contains(&point))
            .map(|(id, _)| id.to_string())
            .unwrap_or_default();

        if actual != expected {
            outcome.mismatches.push(JoinMismatch {
                point_id: feature
                    .attribute(point_id_field)
                    .unwrap_or_default()
                    .to_string(),
                expected_polygon_id: expected,
                actual_polygon_id: actual,
                attributes: feature.attributes.clone(),
            });
        }
        hooks.progress(index + 1, total);
    }

    log::info!(
        "Found {} points outside their polygon ({} skipped)",
        outcome.mismatches.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

fn point_of(feature: &Feature) -> Option<Point<f64>> {
    match feature.geometry {
        Some(Geometry::Point(p)) => Some(p),
        _ => None,
    }
}

/// Aggregate mismatches into the off-point report rows: grouped by the
/// point's stated area code, with a comma-joined list of point identifiers,
/// sorted ascending by code.
pub fn summarize(mismatches: &[JoinMismatch]) -> Vec<OffPointSummary> {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for m in mismatches {
        groups
            .entry(m.expected_polygon_id.as_str())
            .or_default()
            .push(m.point_id.as_str());
    }

    groups
        .into_iter()
        .map(|(id, ids)| OffPointSummary {
            id: id.to_string(),
            count: ids.len(),
            list_id: ids.join(", "),
        })
        .collect()
}

/// Off-point check behind the uniform [`Check`] seam.
#[derive(Debug, Clone, Default)]
pub struct OffPointCheck;

/// Parameters for the off-point check
#[derive(Debug, Clone)]
pub struct OffPointParams {
    /// Area-code column joining points to polygons
    pub id_field: String,
    /// Auxiliary column identifying individual points
    pub point_id_field: String,
}

impl Default for OffPointParams {
    fn default() -> Self {
        Self {
            id_field: "idsls".to_string(),
            point_id_field: "wid".to_string(),
        }
    }
}

impl Check for OffPointCheck {
    type Input = (FeatureCollection, FeatureCollection);
    type Output = OffPointOutcome;
    type Params = OffPointParams;

    fn name(&self) -> &'static str {
        "OffPoint"
    }

    fn description(&self) -> &'static str {
        "Find enumeration points located outside their assigned administrative polygon"
    }

    fn run(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (points, polygons) = input;
        find_mismatches(
            &points,
            &polygons,
            &params.id_field,
            &params.point_id_field,
            &Hooks::default(),
        )
    }
}
