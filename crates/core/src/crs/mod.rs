//! Coordinate Reference System handling and reprojection.
//!
//! Survey sources arrive either in WGS84 geographic coordinates or in a
//! projected metric CRS (UTM). Area arithmetic must happen in a metric CRS
//! and world files are emitted in WGS84, so the supported transform paths
//! are WGS84 ↔ UTM plus the identity.

pub mod utm;

use crate::error::{Error, Result};
use geo::MapCoords;
use geo_types::{Coord, Geometry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System of a feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    /// EPSG code if known
    epsg: Option<u32>,
    /// WKT representation, carried verbatim for sources without a code
    wkt: Option<String>,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// UTM zone CRS (EPSG:326xx north / 327xx south)
    pub fn utm(zone: u32, north: bool) -> Self {
        Self::from_epsg(utm::utm_epsg(zone, north))
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// True for geographic (degree-unit) CRS
    pub fn is_geographic(&self) -> bool {
        self.epsg == Some(4326)
    }

    /// UTM zone info if this is a UTM CRS
    pub fn utm_zone(&self) -> Option<(u32, bool)> {
        self.epsg.and_then(utm::parse_utm_epsg)
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &Crs) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        false
    }

    /// Human-readable identifier used in error messages and logs
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{code}");
        }
        if let Some(wkt) = &self.wkt {
            return format!("WKT:{}", &wkt[..wkt.len().min(50)]);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

/// A coordinate transform between two supported CRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Source and target are the same CRS
    Identity,
    /// WGS84 degrees → UTM metres
    ToUtm { zone: u32, north: bool },
    /// UTM metres → WGS84 degrees
    FromUtm { zone: u32, north: bool },
}

impl Transform {
    /// Resolve the transform between two CRS.
    ///
    /// Returns `UnsupportedReprojection` when no path exists; callers treat
    /// this as a collection-level error for the check at hand.
    pub fn between(src: &Crs, dst: &Crs) -> Result<Self> {
        if src.is_equivalent(dst) {
            return Ok(Transform::Identity);
        }
        if src.is_geographic() {
            if let Some((zone, north)) = dst.utm_zone() {
                return Ok(Transform::ToUtm { zone, north });
            }
        }
        if dst.is_geographic() {
            if let Some((zone, north)) = src.utm_zone() {
                return Ok(Transform::FromUtm { zone, north });
            }
        }
        Err(Error::UnsupportedReprojection {
            from: src.identifier(),
            to: dst.identifier(),
        })
    }

    /// Transform a single coordinate pair.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match *self {
            Transform::Identity => (x, y),
            Transform::ToUtm { zone, north } => utm::wgs84_to_utm(x, y, zone, north),
            Transform::FromUtm { zone, north } => utm::utm_to_wgs84(x, y, zone, north),
        }
    }

    /// Transform every coordinate of a geometry.
    ///
    /// Non-affine transforms bend straight edges, so boxes must be converted
    /// to polygons before passing through here and have their envelope
    /// re-extracted afterwards.
    pub fn geometry(&self, geom: &Geometry<f64>) -> Geometry<f64> {
        match *self {
            Transform::Identity => geom.clone(),
            _ => geom.map_coords(|c: Coord<f64>| {
                let (x, y) = self.apply(c.x, c.y);
                Coord { x, y }
            }),
        }
    }
}
