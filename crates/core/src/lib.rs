//! # GeoQA Core
//!
//! Core types and I/O for the GeoQA survey mapping toolkit.
//!
//! This crate provides:
//! - `Feature` / `FeatureCollection`: the vector data model
//! - `Crs` and `Transform`: coordinate reference handling and reprojection
//! - `BoundingBox`: box algebra for the print-layout pipeline
//! - `Hooks`: caller-supplied progress/cancellation callbacks
//! - I/O for common vector formats

pub mod crs;
pub mod error;
pub mod io;
pub mod progress;
pub mod vector;

pub use crs::{Crs, Transform};
pub use error::{Error, FeatureSkip, Result};
pub use progress::Hooks;
pub use vector::bounds::BoundingBox;
pub use vector::{Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{Crs, Transform};
    pub use crate::error::{Error, FeatureSkip, Result};
    pub use crate::progress::Hooks;
    pub use crate::vector::bounds::BoundingBox;
    pub use crate::vector::{Feature, FeatureCollection};
    pub use crate::Check;
}

/// Core trait for all consistency checks in GeoQA.
///
/// Checks are pure functions over immutable input collections; each run
/// produces new derived collections plus a side channel of skipped features.
pub trait Check {
    /// Input type for the check
    type Input;
    /// Output type for the check
    type Output;
    /// Parameters controlling check behavior
    type Params: Default;

    /// Returns the check name
    fn name(&self) -> &'static str;

    /// Returns a description of what the check does
    fn description(&self) -> &'static str;

    /// Execute the check
    fn run(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output>;

    /// Execute with default parameters
    fn run_default(&self, input: Self::Input) -> Result<Self::Output> {
        self.run(input, Self::Params::default())
    }
}
