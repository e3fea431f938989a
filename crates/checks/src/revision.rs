//! Boundary revision comparison
//!
//! Overlays two vintages of the administrative polygon set and flags two
//! kinds of disagreement: pairs of *different* ids whose overlap is large
//! enough to suggest a mislabelled boundary, and *same*-id polygons whose
//! shape drifted between revisions.
//!
//! All area arithmetic happens in a metric CRS; geographic inputs are
//! reprojected into the UTM zone covering their combined extent first.

use crate::maybe_rayon::*;
use geo::{Area, BooleanOps};
use geo_types::{Geometry, MultiPolygon, Polygon};
use geoqa_core::crs::utm;
use geoqa_core::{
    BoundingBox, Check, Error, FeatureCollection, FeatureSkip, Hooks, Result, Transform,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Significant overlap between two polygons with different ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapRecord {
    pub id_a: String,
    pub id_b: String,
    pub area_a: f64,
    pub area_b: f64,
    pub area_intersection: f64,
    /// area_intersection / area_a
    pub ratio_a: f64,
    /// area_intersection / area_b
    pub ratio_b: f64,
}

/// Shape change of one id between the two vintages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeDriftRecord {
    pub id: String,
    pub area_new: f64,
    pub area_old: f64,
    pub area_intersection: f64,
    /// 1 − area_intersection / mean(area_new, area_old)
    pub change_ratio: f64,
}

/// Result of a revision comparison.
#[derive(Debug, Default)]
pub struct RevisionOutcome {
    pub overlaps: Vec<OverlapRecord>,
    pub drifts: Vec<ShapeDriftRecord>,
    pub skipped: Vec<FeatureSkip>,
}

/// One vintage's polygons aggregated per id, in metric coordinates.
struct Entry {
    id: String,
    shape: MultiPolygon<f64>,
    area: f64,
    bbox: BoundingBox,
}

/// Compare two polygon vintages.
///
/// Thresholds are inclusive (`>=`) and must lie in (0, 1]. Output order is
/// deterministic: overlaps sorted by `(id_a, id_b)`, drifts by `id`.
///
/// # Arguments
/// * `new_polygons` / `old_polygons` - The two vintages
/// * `id_field` - Area-code column present in both collections
/// * `overlap_threshold` - Minimum intersection ratio flagging different-id pairs
/// * `drift_threshold` - Minimum change ratio flagging same-id shape drift
pub fn compare(
    new_polygons: &FeatureCollection,
    old_polygons: &FeatureCollection,
    id_field: &str,
    overlap_threshold: f64,
    drift_threshold: f64,
    hooks: &Hooks,
) -> Result<RevisionOutcome> {
    validate_threshold("overlap_threshold", overlap_threshold)?;
    validate_threshold("drift_threshold", drift_threshold)?;
    new_polygons.require_field(id_field, "new polygon")?;
    old_polygons.require_field(id_field, "old polygon")?;

    let (transform_new, transform_old) = metric_transforms(new_polygons, old_polygons)?;

    let mut outcome = RevisionOutcome::default();
    let new_entries = collect_entries(new_polygons, id_field, transform_new, &mut outcome.skipped);
    let old_entries = collect_entries(old_polygons, id_field, transform_old, &mut outcome.skipped);

    if new_entries.is_empty() {
        return Err(Error::EmptyCollection {
            collection: "new polygon".to_string(),
        });
    }
    if old_entries.is_empty() {
        return Err(Error::EmptyCollection {
            collection: "old polygon".to_string(),
        });
    }

    log::info!(
        "Comparing {} new against {} old polygon ids",
        new_entries.len(),
        old_entries.len()
    );

    let total = new_entries.len();
    hooks.progress(0, total);
    let done = AtomicUsize::new(0);
    let stopped = AtomicBool::new(false);

    // Pairwise overlay; each new-vintage id is an independent unit of work.
    let pairings: Vec<Pairing> = new_entries
        .into_par_iter()
        .flat_map(|new| {
            if stopped.load(Ordering::Relaxed) || hooks.is_cancelled() {
                stopped.store(true, Ordering::Relaxed);
                return Vec::new();
            }

            let mut local = Vec::new();
            for old in &old_entries {
                if !new.bbox.intersects(&old.bbox) {
                    continue;
                }
                let intersection = new.shape.intersection(&old.shape);
                let area = intersection.unsigned_area();
                // Degenerate point/line touches carry no area
                if area <= 0.0 {
                    continue;
                }
                local.push(Pairing {
                    id_a: new.id.clone(),
                    id_b: old.id.clone(),
                    area_a: new.area,
                    area_b: old.area,
                    area_intersection: area,
                });
            }
            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            hooks.progress(current, total);
            local
        })
        .collect();

    if stopped.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
    }

    for p in pairings {
        if p.id_a != p.id_b {
            let ratio_a = p.area_intersection / p.area_a;
            let ratio_b = p.area_intersection / p.area_b;
            if ratio_a >= overlap_threshold || ratio_b >= overlap_threshold {
                outcome.overlaps.push(OverlapRecord {
                    id_a: p.id_a,
                    id_b: p.id_b,
                    area_a: p.area_a,
                    area_b: p.area_b,
                    area_intersection: p.area_intersection,
                    ratio_a,
                    ratio_b,
                });
            }
        } else {
            let mean = (p.area_a + p.area_b) / 2.0;
            let change_ratio = 1.0 - p.area_intersection / mean;
            if change_ratio >= drift_threshold {
                outcome.drifts.push(ShapeDriftRecord {
                    id: p.id_a,
                    area_new: p.area_a,
                    area_old: p.area_b,
                    area_intersection: p.area_intersection,
                    change_ratio,
                });
            }
        }
    }

    log::info!(
        "Revision comparison: {} overlaps, {} drifted ids, {} skipped",
        outcome.overlaps.len(),
        outcome.drifts.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

struct Pairing {
    id_a: String,
    id_b: String,
    area_a: f64,
    area_b: f64,
    area_intersection: f64,
}

fn validate_threshold(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must lie in (0, 1]".to_string(),
        })
    }
}

/// Resolve the transforms taking both vintages into one metric CRS.
fn metric_transforms(
    new_polygons: &FeatureCollection,
    old_polygons: &FeatureCollection,
) -> Result<(Transform, Transform)> {
    let ncrs = new_polygons.crs();
    let ocrs = old_polygons.crs();

    if ncrs.is_geographic() && ocrs.is_geographic() {
        let (cx, cy) = combined_center(new_polygons, old_polygons);
        let (zone, north) = utm::zone_for(cx, cy);
        let to_utm = Transform::ToUtm { zone, north };
        return Ok((to_utm, to_utm));
    }
    if ncrs.is_equivalent(ocrs) {
        return Ok((Transform::Identity, Transform::Identity));
    }
    if ncrs.is_geographic() {
        if let Some((zone, north)) = ocrs.utm_zone() {
            return Ok((Transform::ToUtm { zone, north }, Transform::Identity));
        }
    }
    if ocrs.is_geographic() {
        if let Some((zone, north)) = ncrs.utm_zone() {
            return Ok((Transform::Identity, Transform::ToUtm { zone, north }));
        }
    }
    Err(Error::CrsMismatch {
        left: ncrs.identifier(),
        right: ocrs.identifier(),
    })
}

fn combined_center(a: &FeatureCollection, b: &FeatureCollection) -> (f64, f64) {
    let mut merged: Option<BoundingBox> = None;
    for feature in a.iter().chain(b.iter()) {
        let Some(geom) = &feature.geometry else {
            continue;
        };
        let Some(bb) = BoundingBox::from_geometry(geom) else {
            continue;
        };
        merged = Some(match merged {
            None => bb,
            Some(m) => BoundingBox::new(
                m.min_x.min(bb.min_x),
                m.min_y.min(bb.min_y),
                m.max_x.max(bb.max_x),
                m.max_y.max(bb.max_y),
            ),
        });
    }
    merged.map(|m| m.center()).unwrap_or((0.0, 0.0))
}

/// Aggregate a vintage's polygons per id in metric coordinates.
///
/// Multi-part shapes become one multipolygon per id, so a polygon split
/// across several fragments yields one logical pairing. Zero-area entries
/// are skipped here, which keeps every downstream ratio finite.
fn collect_entries(
    collection: &FeatureCollection,
    id_field: &str,
    transform: Transform,
    skipped: &mut Vec<FeatureSkip>,
) -> Vec<Entry> {
    let mut parts: BTreeMap<String, Vec<Polygon<f64>>> = BTreeMap::new();

    for feature in collection.iter() {
        let id = feature.attribute(id_field).unwrap_or_default().to_string();
        match &feature.geometry {
            Some(geom @ (Geometry::Polygon(_) | Geometry::MultiPolygon(_))) => {
                match transform.geometry(geom) {
                    Geometry::Polygon(p) => parts.entry(id).or_default().push(p),
                    Geometry::MultiPolygon(mp) => parts.entry(id).or_default().extend(mp.0),
                    _ => unreachable!("transform preserves geometry type"),
                }
            }
            Some(_) => {
                skipped.push(FeatureSkip::new(id, "non-polygon geometry skipped"));
            }
            None => {
                skipped.push(FeatureSkip::new(id, "empty geometry skipped"));
            }
        }
    }

    let mut entries = Vec::with_capacity(parts.len());
    for (id, polys) in parts {
        let shape = MultiPolygon::new(polys);
        let area = shape.unsigned_area();
        let bbox = BoundingBox::from_geometry(&Geometry::MultiPolygon(shape.clone()));
        match bbox {
            Some(bbox) if area > 0.0 => entries.push(Entry {
                id,
                shape,
                area,
                bbox,
            }),
            _ => {
                log::warn!("Polygon '{id}' has zero area after reprojection, skipped");
                skipped.push(FeatureSkip::new(id, "zero area after reprojection"));
            }
        }
    }
    entries
}

/// Revision comparison behind the uniform [`Check`] seam.
#[derive(Debug, Clone, Default)]
pub struct RevisionCompare;

/// Parameters for revision comparison
#[derive(Debug, Clone)]
pub struct RevisionParams {
    pub id_field: String,
    pub overlap_threshold: f64,
    pub drift_threshold: f64,
}

impl Default for RevisionParams {
    fn default() -> Self {
        Self {
            id_field: "idsls".to_string(),
            overlap_threshold: 0.5,
            drift_threshold: 0.05,
        }
    }
}

impl Check for RevisionCompare {
    type Input = (FeatureCollection, FeatureCollection);
    type Output = RevisionOutcome;
    type Params = RevisionParams;

    fn name(&self) -> &'static str {
        "RevisionCompare"
    }

    fn description(&self) -> &'static str {
        "Flag significant overlaps and shape drift between two boundary polygon vintages"
    }

    fn run(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (new_polygons, old_polygons) = input;
        compare(
            &new_polygons,
            &old_polygons,
            &params.id_field,
            params.overlap_threshold,
            params.drift_threshold,
            &Hooks::default(),
        )
    }
}
