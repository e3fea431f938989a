//! Axis-aligned bounding box algebra.
//!
//! The world-file pipeline is mostly box arithmetic: symmetric expansion,
//! aspect-ratio correction, margin growth, corner-wise reprojection.

use geo::BoundingRect;
use geo_types::{Geometry, LineString, Polygon};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounding box of a geometry, if it has one.
    pub fn from_geometry(geom: &Geometry<f64>) -> Option<Self> {
        geom.bounding_rect().map(|rect| Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// width / height. Degenerate boxes yield non-finite values; callers
    /// must skip zero-height boxes before asking.
    pub fn aspect_ratio(&self) -> f64 {
        self.width() / self.height()
    }

    /// True when either dimension collapses to (near) zero.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= f64::EPSILON || self.height() <= f64::EPSILON
    }

    /// Grow the x extent symmetrically so total width increases by `amount`.
    pub fn expand_x(&self, amount: f64) -> Self {
        let half = amount / 2.0;
        Self::new(self.min_x - half, self.min_y, self.max_x + half, self.max_y)
    }

    /// Grow the y extent symmetrically so total height increases by `amount`.
    pub fn expand_y(&self, amount: f64) -> Self {
        let half = amount / 2.0;
        Self::new(self.min_x, self.min_y - half, self.max_x, self.max_y + half)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// The box as a closed polygon ring, counter-clockwise from the
    /// lower-left corner. Needed before any non-affine reprojection.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}
