//! Native GeoJSON reading (no GDAL dependency).
//!
//! GeoJSON coordinates are WGS84 by definition (RFC 7946), so collections
//! read here always carry EPSG:4326. For GeoPackage/Shapefile sources,
//! enable the `gdal` feature.

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::vector::{Feature, FeatureCollection};
use geojson::GeoJson;
use serde_json::Value as JsonValue;
use std::path::Path;

/// Read a GeoJSON file into a `FeatureCollection`.
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    log::info!("Reading GeoJSON source: {}", path.as_ref().display());
    let text = std::fs::read_to_string(path)?;
    parse_geojson(&text)
}

/// Parse GeoJSON text into a `FeatureCollection`.
///
/// Features whose geometry is absent or unconvertible keep `geometry: None`
/// rather than failing the whole read; downstream checks skip them with a
/// per-feature note.
pub fn parse_geojson(text: &str) -> Result<FeatureCollection> {
    let gj: GeoJson = text.parse().map_err(|e| Error::Format(format!("{e}")))?;

    let features = match gj {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(Error::Format(
                "bare geometry without feature attributes".to_string(),
            ))
        }
    };

    let mut out = FeatureCollection::new(Crs::wgs84());
    for gf in features {
        let geometry = gf
            .geometry
            .and_then(|g| geo_types::Geometry::<f64>::try_from(g.value).ok());

        let mut feature = match geometry {
            Some(g) => Feature::new(g),
            None => Feature::empty(),
        };

        if let Some(props) = gf.properties {
            for (key, value) in props {
                if let Some(text) = stringify(&value) {
                    feature.attributes.insert(key, text);
                }
            }
        }
        out.push(feature);
    }

    log::debug!("Parsed {} features from GeoJSON", out.len());
    Ok(out)
}

/// Attribute values are carried as verbatim text; nulls are dropped so that
/// schema validation can distinguish "column absent" from "column empty".
fn stringify(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
