//! # GeoQA Checks
//!
//! Consistency checks and georeferencing for survey boundary data:
//! - `offpoint`: enumeration points outside their assigned polygon
//! - `revision`: overlap and shape drift between two polygon vintages
//! - `worldfile`: affine world-file parameters for printed map sheets
//!
//! Each check is a pure function over immutable [`FeatureCollection`]s
//! returning derived records plus a side channel of skipped features.
//! Callers drive progress reporting and cancellation through
//! [`Hooks`](geoqa_core::Hooks).

pub mod offpoint;
pub mod revision;
pub mod worldfile;

mod maybe_rayon;

pub use offpoint::{JoinMismatch, OffPointCheck, OffPointOutcome, OffPointSummary};
pub use revision::{OverlapRecord, RevisionCompare, RevisionOutcome, ShapeDriftRecord};
pub use worldfile::{
    PageLayoutProfile, WorldFileGen, WorldFileOutcome, WorldFileParams, WorldFileRecord,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::offpoint::{
        JoinMismatch, OffPointCheck, OffPointOutcome, OffPointParams, OffPointSummary,
    };
    pub use crate::revision::{
        OverlapRecord, RevisionCompare, RevisionOutcome, RevisionParams, ShapeDriftRecord,
    };
    pub use crate::worldfile::{
        Margins, Orientation, PageLayoutProfile, WorldFileGen, WorldFileOptions, WorldFileOutcome,
        WorldFileParams, WorldFileRecord,
    };
    pub use geoqa_core::prelude::*;
}
