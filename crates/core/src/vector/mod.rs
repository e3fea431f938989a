//! Vector feature model shared by all consistency checks.
//!
//! Features are read-only snapshots built once per invocation from the input
//! files; checks derive new collections instead of mutating them. The
//! attribute set is open: columns the checks do not understand pass through
//! untouched so the report layer can consume them verbatim.

pub mod bounds;

use crate::crs::Crs;
use crate::error::{Error, Result};
use geo_types::Geometry;
use std::collections::HashMap;

/// A survey feature: open attribute map plus an optional geometry.
///
/// Geometry may be absent for invalid/empty source rows; such features are
/// skippable, never fatal.
#[derive(Debug, Clone)]
pub struct Feature {
    pub attributes: HashMap<String, String>,
    pub geometry: Option<Geometry<f64>>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            attributes: HashMap::new(),
            geometry: Some(geometry),
        }
    }

    /// A feature with no geometry
    pub fn empty() -> Self {
        Self {
            attributes: HashMap::new(),
            geometry: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }
}

/// An ordered sequence of features sharing one CRS.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    features: Vec<Feature>,
    crs: Crs,
}

impl FeatureCollection {
    pub fn new(crs: Crs) -> Self {
        Self {
            features: Vec::new(),
            crs,
        }
    }

    pub fn from_features(crs: Crs, features: Vec<Feature>) -> Self {
        Self { features, crs }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// One-shot schema validation: every feature must carry `field`.
    ///
    /// `label` names the collection in the resulting `Schema` error so the
    /// report layer can tell the user which input file is deficient.
    pub fn require_field(&self, field: &str, label: &str) -> Result<()> {
        if self.features.iter().all(|f| f.attributes.contains_key(field)) {
            Ok(())
        } else {
            Err(Error::Schema {
                field: field.to_string(),
                collection: label.to_string(),
            })
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
