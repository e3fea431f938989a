//! World-file generation for printed map sheets.
//!
//! Takes each boundary polygon through a fixed box pipeline
//! (expand, ratio-correct, margins, reproject) and derives the six
//! affine coefficients that georeference the printed raster sheet.

use geo_types::Geometry;
use geoqa_core::{
    BoundingBox, Check, Crs, Error, FeatureCollection, FeatureSkip, Hooks, Result, Transform,
};
use serde::Serialize;

/// Page orientation of a printed map sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Landscape,
    Portrait,
}

/// Print whitespace as fractions of the ratio-corrected box dimensions.
///
/// Survey forms reserve asymmetric space for the header, legend strip and
/// footer, so the four edges carry independent fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margins {
    pub upper: f64,
    pub lower: f64,
    pub left: f64,
    pub right: f64,
}

/// Fixed layout of one printed page orientation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayoutProfile {
    pub orientation: Orientation,
    /// Map-frame aspect as (width, height) units
    pub target_ratio: (f64, f64),
    pub margins: Margins,
    /// Raster size of the rendered sheet in pixels
    pub pixel_dimensions: (u32, u32),
    pub dpi: u32,
}

impl PageLayoutProfile {
    /// Survey-form landscape sheet at 200 dpi.
    pub fn landscape() -> Self {
        Self {
            orientation: Orientation::Landscape,
            target_ratio: (324.0, 272.0),
            margins: Margins {
                upper: 0.10,
                lower: 0.05,
                left: 0.04,
                right: 0.04,
            },
            pixel_dimensions: (3307, 2338),
            dpi: 200,
        }
    }

    /// Survey-form portrait sheet at 200 dpi.
    pub fn portrait() -> Self {
        Self {
            orientation: Orientation::Portrait,
            target_ratio: (272.0, 324.0),
            margins: Margins {
                upper: 0.10,
                lower: 0.05,
                left: 0.04,
                right: 0.04,
            },
            pixel_dimensions: (2338, 3307),
            dpi: 200,
        }
    }

    fn validate(&self, name: &'static str) -> Result<()> {
        if self.dpi == 0 {
            return Err(Error::InvalidParameter {
                name,
                value: "dpi=0".to_string(),
                reason: "dpi must be positive".to_string(),
            });
        }
        if self.pixel_dimensions.0 == 0 || self.pixel_dimensions.1 == 0 {
            return Err(Error::InvalidParameter {
                name,
                value: format!("{:?}", self.pixel_dimensions),
                reason: "pixel dimensions must be positive".to_string(),
            });
        }
        if self.target_ratio.0 <= 0.0 || self.target_ratio.1 <= 0.0 {
            return Err(Error::InvalidParameter {
                name,
                value: format!("{:?}", self.target_ratio),
                reason: "target ratio components must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Six-coefficient affine georeference of one sheet.
///
/// The rotation terms are always zero; the sheet raster is axis-aligned
/// with the output CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldFileParams {
    pub x_scale: f64,
    /// Negative: raster row 0 is the northern edge
    pub y_scale: f64,
    pub upper_left_x: f64,
    pub upper_left_y: f64,
}

impl WorldFileParams {
    /// The six-line sidecar text, one value per line, 12 decimal digits.
    pub fn contents(&self) -> String {
        format!(
            "{:.12}\n{:.12}\n{:.12}\n{:.12}\n{:.12}\n{:.12}\n",
            self.x_scale, 0.0, 0.0, self.y_scale, self.upper_left_x, self.upper_left_y
        )
    }

    /// Sidecar file name for a polygon id, e.g. `3201_WS.jgw`.
    pub fn file_name(id: &str, extension: &str) -> String {
        format!("{id}_WS.{extension}")
    }
}

/// One generated sheet georeference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldFileRecord {
    pub id: String,
    pub params: WorldFileParams,
    pub pixel_dimensions: (u32, u32),
    pub orientation: Orientation,
    /// Final sheet bounds in the output CRS
    pub bounds: (f64, f64, f64, f64),
}

/// Result of a world-file generation batch.
#[derive(Debug, Default)]
pub struct WorldFileOutcome {
    pub records: Vec<WorldFileRecord>,
    pub skipped: Vec<FeatureSkip>,
}

/// Parameters for world-file generation
#[derive(Debug, Clone)]
pub struct WorldFileOptions {
    pub id_field: String,
    /// Short-axis padding as a fraction of the longer bound dimension
    pub expand_fraction: f64,
    pub landscape: PageLayoutProfile,
    pub portrait: PageLayoutProfile,
}

impl Default for WorldFileOptions {
    fn default() -> Self {
        Self {
            id_field: "idsls".to_string(),
            expand_fraction: 0.05,
            landscape: PageLayoutProfile::landscape(),
            portrait: PageLayoutProfile::portrait(),
        }
    }
}

impl WorldFileOptions {
    fn validate(&self) -> Result<()> {
        if !(self.expand_fraction >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "expand_fraction",
                value: self.expand_fraction.to_string(),
                reason: "must be >= 0".to_string(),
            });
        }
        self.landscape.validate("landscape profile")?;
        self.portrait.validate("portrait profile")
    }
}

/// Generate world-file parameters for every polygon in the collection.
///
/// The box pipeline runs in the source CRS in a fixed order: expand the
/// short axis, correct to the orientation's target ratio, grow the print
/// margins, then reproject into WGS84 for output. Orientation of the output
/// pixel grid is re-derived from the final reprojected box, which may flip
/// relative to the source box under reprojection distortion.
///
/// Bad polygons (no geometry, degenerate bounds) are skipped per feature;
/// the batch always completes.
pub fn generate(
    polygons: &FeatureCollection,
    options: &WorldFileOptions,
    hooks: &Hooks,
) -> Result<WorldFileOutcome> {
    options.validate()?;
    polygons.require_field(&options.id_field, "polygon")?;

    let transform = Transform::between(polygons.crs(), &Crs::wgs84())?;

    let total = polygons.len();
    log::info!("Generating world files for {total} polygons");
    hooks.progress(0, total);

    let mut outcome = WorldFileOutcome::default();
    for (index, feature) in polygons.iter().enumerate() {
        hooks.check_cancelled()?;
        let id = feature
            .attribute(&options.id_field)
            .unwrap_or_default()
            .to_string();

        match sheet_for(feature.geometry.as_ref(), options, transform) {
            Ok((params, pixel_dimensions, orientation, bounds)) => {
                outcome.records.push(WorldFileRecord {
                    id,
                    params,
                    pixel_dimensions,
                    orientation,
                    bounds,
                });
            }
            Err(reason) => {
                log::warn!("Polygon '{id}' skipped: {reason}");
                outcome.skipped.push(FeatureSkip::new(id, reason));
            }
        }
        hooks.progress(index + 1, total);
    }

    log::info!(
        "World files: {} generated, {} skipped",
        outcome.records.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

type Sheet = (WorldFileParams, (u32, u32), Orientation, (f64, f64, f64, f64));

fn sheet_for(
    geometry: Option<&Geometry<f64>>,
    options: &WorldFileOptions,
    transform: Transform,
) -> std::result::Result<Sheet, String> {
    let geom = geometry.ok_or_else(|| "empty geometry".to_string())?;
    if !matches!(geom, Geometry::Polygon(_) | Geometry::MultiPolygon(_)) {
        return Err("non-polygon geometry".to_string());
    }
    let bounds = BoundingBox::from_geometry(geom).ok_or_else(|| "no bounds".to_string())?;
    if bounds.is_degenerate() {
        return Err("degenerate bounds".to_string());
    }

    let orientation = orientation_of(&bounds);
    let profile = match orientation {
        Orientation::Landscape => &options.landscape,
        Orientation::Portrait => &options.portrait,
    };

    let expanded = expand_short_axis(&bounds, orientation, options.expand_fraction);
    let corrected = correct_ratio(&expanded, profile.target_ratio);
    let framed = apply_margins(&corrected, &profile.margins);

    // Reprojection bends straight edges, so the box goes through as a
    // polygon and has its envelope re-extracted.
    let projected = transform.geometry(&Geometry::Polygon(framed.to_polygon()));
    let fin = BoundingBox::from_geometry(&projected)
        .ok_or_else(|| "no bounds after reprojection".to_string())?;
    if fin.is_degenerate() {
        return Err("degenerate bounds after reprojection".to_string());
    }

    let final_orientation = orientation_of(&fin);
    let (pw, ph) = match final_orientation {
        Orientation::Landscape => options.landscape.pixel_dimensions,
        Orientation::Portrait => options.portrait.pixel_dimensions,
    };

    let x_scale = fin.width() / pw as f64;
    let y_scale = (fin.min_y - fin.max_y) / ph as f64;
    let params = WorldFileParams {
        x_scale,
        y_scale,
        // Pixel-center convention: the first coefficient pair addresses the
        // centre of pixel (0, 0), not its outer corner.
        upper_left_x: fin.min_x + x_scale / 2.0,
        upper_left_y: fin.max_y + y_scale / 2.0,
    };
    Ok((
        params,
        (pw, ph),
        final_orientation,
        (fin.min_x, fin.min_y, fin.max_x, fin.max_y),
    ))
}

fn orientation_of(bounds: &BoundingBox) -> Orientation {
    if bounds.width() > bounds.height() {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

/// Pad the axis that does not define the orientation by
/// `fraction * max(width, height)`, split evenly over both sides.
fn expand_short_axis(bounds: &BoundingBox, orientation: Orientation, fraction: f64) -> BoundingBox {
    let amount = fraction * bounds.width().max(bounds.height());
    match orientation {
        Orientation::Landscape => bounds.expand_x(amount),
        Orientation::Portrait => bounds.expand_y(amount),
    }
}

/// Grow one axis symmetrically until width / height equals the target
/// ratio exactly. Growth only; the box never shrinks.
fn correct_ratio(bounds: &BoundingBox, target_ratio: (f64, f64)) -> BoundingBox {
    let target = target_ratio.0 / target_ratio.1;
    if bounds.aspect_ratio() > target {
        // Too wide for the frame: grow height
        let new_height = bounds.width() * target_ratio.1 / target_ratio.0;
        bounds.expand_y(new_height - bounds.height())
    } else {
        // Too tall (or exact): grow width
        let new_width = bounds.height() * target_ratio.0 / target_ratio.1;
        bounds.expand_x(new_width - bounds.width())
    }
}

/// Grow each edge outward by its margin fraction of the corrected box
/// dimensions.
fn apply_margins(bounds: &BoundingBox, margins: &Margins) -> BoundingBox {
    let w = bounds.width();
    let h = bounds.height();
    BoundingBox::new(
        bounds.min_x - margins.left * w,
        bounds.min_y - margins.lower * h,
        bounds.max_x + margins.right * w,
        bounds.max_y + margins.upper * h,
    )
}

/// World-file generation behind the uniform [`Check`] seam.
#[derive(Debug, Clone, Default)]
pub struct WorldFileGen;

impl Check for WorldFileGen {
    type Input = FeatureCollection;
    type Output = WorldFileOutcome;
    type Params = WorldFileOptions;

    fn name(&self) -> &'static str {
        "WorldFileGen"
    }

    fn description(&self) -> &'static str {
        "Derive six-coefficient affine world files from polygon bounds and page layouts"
    }

    fn run(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        generate(&input, &params, &Hooks::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{polygon, Point};
    use geoqa_core::Feature;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ])
    }

    fn zero_margins(mut profile: PageLayoutProfile) -> PageLayoutProfile {
        profile.margins = Margins {
            upper: 0.0,
            lower: 0.0,
            left: 0.0,
            right: 0.0,
        };
        profile
    }

    fn bare_options() -> WorldFileOptions {
        WorldFileOptions {
            expand_fraction: 0.0,
            landscape: zero_margins(PageLayoutProfile::landscape()),
            portrait: zero_margins(PageLayoutProfile::portrait()),
            ..WorldFileOptions::default()
        }
    }

    #[test]
    fn test_ratio_correction_square_landscape() {
        // 10x10 box against the landscape frame 324:272. The box is not
        // too wide (1.0 < 324/272), so width grows to 10 * 324 / 272.
        let bb = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let corrected = correct_ratio(&bb, (324.0, 272.0));

        let new_width = 10.0 * 324.0 / 272.0;
        assert_relative_eq!(new_width, 11.911764705882353, epsilon = 1e-12);
        let delta = (new_width - 10.0) / 2.0;
        assert_relative_eq!(delta, 0.9558823529411766, epsilon = 1e-12);

        assert_relative_eq!(corrected.min_x, -delta, epsilon = 1e-12);
        assert_relative_eq!(corrected.min_y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(corrected.max_x, 10.0 + delta, epsilon = 1e-12);
        assert_relative_eq!(corrected.max_y, 10.0, epsilon = 1e-12);
        // The corrected aspect ratio matches the target exactly
        assert_relative_eq!(
            corrected.aspect_ratio(),
            324.0 / 272.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_ratio_correction_too_wide_grows_height() {
        let bb = BoundingBox::new(0.0, 0.0, 20.0, 10.0);
        let corrected = correct_ratio(&bb, (324.0, 272.0));
        assert_relative_eq!(corrected.width(), 20.0, epsilon = 1e-12);
        assert_relative_eq!(
            corrected.height(),
            20.0 * 272.0 / 324.0,
            epsilon = 1e-12
        );
        assert!(corrected.height() > 10.0);
        assert_relative_eq!(
            corrected.aspect_ratio(),
            324.0 / 272.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_expand_short_axis() {
        let bb = BoundingBox::new(0.0, 0.0, 20.0, 10.0);
        let landscape = expand_short_axis(&bb, Orientation::Landscape, 0.05);
        // fraction * max dimension = 1.0, split over both x sides
        assert_relative_eq!(landscape.min_x, -0.5, epsilon = 1e-12);
        assert_relative_eq!(landscape.max_x, 20.5, epsilon = 1e-12);
        assert_eq!(landscape.min_y, 0.0);
        assert_eq!(landscape.max_y, 10.0);

        let tall = BoundingBox::new(0.0, 0.0, 10.0, 20.0);
        let portrait = expand_short_axis(&tall, Orientation::Portrait, 0.05);
        assert_relative_eq!(portrait.min_y, -0.5, epsilon = 1e-12);
        assert_relative_eq!(portrait.max_y, 20.5, epsilon = 1e-12);
    }

    #[test]
    fn test_margins_asymmetric() {
        let bb = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
        let m = Margins {
            upper: 0.10,
            lower: 0.05,
            left: 0.04,
            right: 0.02,
        };
        let framed = apply_margins(&bb, &m);
        assert_relative_eq!(framed.min_x, -4.0, epsilon = 1e-12);
        assert_relative_eq!(framed.max_x, 102.0, epsilon = 1e-12);
        assert_relative_eq!(framed.min_y, -2.5, epsilon = 1e-12);
        assert_relative_eq!(framed.max_y, 55.0, epsilon = 1e-12);
    }

    #[test]
    fn test_roundtrip_reconstructs_bounds() {
        let polygons = FeatureCollection::from_features(
            Crs::wgs84(),
            vec![
                Feature::new(rect(106.80, -6.20, 106.95, -6.10)).with_attribute("idsls", "3201"),
                Feature::new(rect(107.00, -6.50, 107.05, -6.30)).with_attribute("idsls", "3202"),
            ],
        );

        let outcome = generate(&polygons, &WorldFileOptions::default(), &Hooks::default()).unwrap();
        assert_eq!(outcome.records.len(), 2);

        for record in &outcome.records {
            let (xmin, ymin, xmax, ymax) = record.bounds;
            let (pw, ph) = record.pixel_dimensions;
            let p = record.params;

            let rx_min = p.upper_left_x - p.x_scale / 2.0;
            let rx_max = rx_min + p.x_scale * pw as f64;
            let ry_max = p.upper_left_y - p.y_scale / 2.0;
            let ry_min = ry_max + p.y_scale * ph as f64;

            assert_relative_eq!(rx_min, xmin, epsilon = 1e-9);
            assert_relative_eq!(rx_max, xmax, epsilon = 1e-9);
            assert_relative_eq!(ry_min, ymin, epsilon = 1e-9);
            assert_relative_eq!(ry_max, ymax, epsilon = 1e-9);
            assert!(p.y_scale < 0.0);
        }
    }

    #[test]
    fn test_orientation_flips_after_reprojection() {
        // A portrait box in UTM metres near 60°N spans more degrees of
        // longitude than latitude once reprojected, so the output grid
        // flips to landscape.
        let polygons = FeatureCollection::from_features(
            Crs::utm(33, true),
            vec![Feature::new(rect(495_500.0, 6_650_000.0, 504_500.0, 6_660_000.0))
                .with_attribute("idsls", "N1")],
        );

        let outcome = generate(&polygons, &bare_options(), &Hooks::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        let record = &outcome.records[0];
        assert_eq!(record.orientation, Orientation::Landscape);
        assert_eq!(record.pixel_dimensions, (3307, 2338));
        let (xmin, ymin, xmax, ymax) = record.bounds;
        assert!(xmax - xmin > ymax - ymin);
    }

    #[test]
    fn test_degenerate_and_missing_geometry_skipped() {
        let polygons = FeatureCollection::from_features(
            Crs::wgs84(),
            vec![
                Feature::new(rect(106.80, -6.20, 106.90, -6.10)).with_attribute("idsls", "OK"),
                Feature::empty().with_attribute("idsls", "EMPTY"),
                Feature::new(Geometry::Point(Point::new(106.8, -6.2)))
                    .with_attribute("idsls", "POINT"),
                Feature::new(rect(107.0, -6.0, 107.0, -6.0)).with_attribute("idsls", "FLAT"),
            ],
        );

        let outcome = generate(&polygons, &WorldFileOptions::default(), &Hooks::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].id, "OK");
        let skipped: Vec<&str> = outcome.skipped.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(skipped, vec!["EMPTY", "POINT", "FLAT"]);
    }

    #[test]
    fn test_contents_format() {
        let params = WorldFileParams {
            x_scale: 0.000045197,
            y_scale: -0.000045197,
            upper_left_x: 106.800022598,
            upper_left_y: -6.100022599,
        };
        let text = params.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "0.000045197000");
        assert_eq!(lines[1], "0.000000000000");
        assert_eq!(lines[2], "0.000000000000");
        assert_eq!(lines[3], "-0.000045197000");
        assert_eq!(lines[4], "106.800022598000");
        assert_eq!(lines[5], "-6.100022599000");
        for line in &lines[..] {
            let decimals = line.split('.').nth(1).unwrap();
            assert_eq!(decimals.len(), 12);
        }
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(WorldFileParams::file_name("3201", "jgw"), "3201_WS.jgw");
        assert_eq!(WorldFileParams::file_name("3201", "pgw"), "3201_WS.pgw");
    }

    #[test]
    fn test_invalid_options() {
        let mut options = WorldFileOptions {
            expand_fraction: -0.1,
            ..WorldFileOptions::default()
        };
        let polygons = FeatureCollection::from_features(
            Crs::wgs84(),
            vec![Feature::new(rect(0.0, 0.0, 1.0, 1.0)).with_attribute("idsls", "1")],
        );
        assert!(matches!(
            generate(&polygons, &options, &Hooks::default()),
            Err(Error::InvalidParameter { .. })
        ));

        options.expand_fraction = 0.05;
        options.landscape.dpi = 0;
        assert!(matches!(
            generate(&polygons, &options, &Hooks::default()),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_missing_id_field() {
        let polygons = FeatureCollection::from_features(
            Crs::wgs84(),
            vec![Feature::new(rect(0.0, 0.0, 1.0, 1.0)).with_attribute("kode", "1")],
        );
        let err = generate(&polygons, &WorldFileOptions::default(), &Hooks::default()).unwrap_err();
        match err {
            Error::Schema { field, collection } => {
                assert_eq!(field, "idsls");
                assert_eq!(collection, "polygon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_trait() {
        let polygons = FeatureCollection::from_features(
            Crs::wgs84(),
            vec![Feature::new(rect(106.8, -6.2, 106.9, -6.1)).with_attribute("idsls", "3201")],
        );
        let outcome = WorldFileGen.run_default(polygons).unwrap();
        assert_eq!(outcome.records.len(), 1);
    }
}
