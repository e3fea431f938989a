//! Vector reading through GDAL/OGR (GeoPackage, Shapefile, ...).
//!
//! Only compiled with the `gdal` feature. Reads the first layer of the
//! dataset; the survey workflow ships one layer per file.

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::vector::{Feature, FeatureCollection};
use gdal::vector::LayerAccess;
use gdal::Dataset;
use std::path::Path;

/// Read the first layer of any OGR-supported vector source.
pub fn read_vector<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    log::info!("Reading vector source: {}", path.as_ref().display());
    let dataset = Dataset::open(path.as_ref())?;
    let mut layer = dataset.layer(0)?;

    let crs = match layer.spatial_ref() {
        Some(srs) => match srs.auth_code() {
            Ok(code) => Crs::from_epsg(code as u32),
            Err(_) => Crs::from_wkt(srs.to_wkt()?),
        },
        None => {
            return Err(Error::UnsupportedReprojection {
                from: "missing CRS".to_string(),
                to: "any".to_string(),
            })
        }
    };

    let mut out = FeatureCollection::new(crs);
    for gdal_feature in layer.features() {
        let geometry = gdal_feature
            .geometry()
            .and_then(|g| g.to_geo().ok());

        let mut feature = match geometry {
            Some(g) => Feature::new(g),
            None => Feature::empty(),
        };

        for (name, value) in gdal_feature.fields() {
            if let Some(value) = value {
                feature
                    .attributes
                    .insert(name, field_to_string(&value));
            }
        }
        out.push(feature);
    }

    log::debug!("Read {} features", out.len());
    Ok(out)
}

fn field_to_string(value: &gdal::vector::FieldValue) -> String {
    use gdal::vector::FieldValue;
    match value {
        FieldValue::StringValue(s) => s.clone(),
        FieldValue::IntegerValue(v) => v.to_string(),
        FieldValue::Integer64Value(v) => v.to_string(),
        FieldValue::RealValue(v) => v.to_string(),
        other => format!("{other:?}"),
    }
}
