//! Error types for GeoQA

use thiserror::Error;

/// Main error type for GeoQA operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Column '{field}' was not found in the {collection} file")]
    Schema { field: String, collection: String },

    #[error("The {collection} file contains no usable features")]
    EmptyCollection { collection: String },

    #[error("Feature '{id}': {reason}")]
    Geometry { id: String, reason: String },

    #[error("CRS mismatch: {left} vs {right}")]
    CrsMismatch { left: String, right: String },

    #[error("No reprojection path from {from} to {to}")]
    UnsupportedReprojection { from: String, to: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unreadable source: {0}")]
    Format(String),

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    #[error("Operation cancelled")]
    Cancelled,
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

/// Result type alias for GeoQA operations
pub type Result<T> = std::result::Result<T, Error>;

/// A feature that was skipped during a batch run.
///
/// Per-feature data-quality problems (missing geometry, degenerate shapes,
/// zero areas) are collected into a side channel instead of aborting the
/// whole batch. The `id` is whatever identifier was available at the time,
/// possibly a positional one for features lacking the id column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSkip {
    pub id: String,
    pub reason: String,
}

impl FeatureSkip {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
