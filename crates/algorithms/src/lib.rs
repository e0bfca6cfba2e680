//! # Coastview Algorithms
//!
//! Raster analysis stages for directional coastal exposure.
//!
//! ## Algorithm Categories
//!
//! - **conversion**: Rasterize vector features, resample raster layers onto a window
//! - **classification**: Rule-based reclassification, compass sector maps
//! - **visibility**: Line-of-sight viewshed from an observer point
//! - **statistics**: Visible-ocean statistics per compass sector
//! - **exposure**: Per-point pipeline combining all of the above

pub mod classification;
pub mod conversion;
pub mod exposure;
pub(crate) mod maybe_rayon;
pub mod statistics;
pub mod visibility;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classification::{
        back_bearing, classify_directions, direction_rules, reclassify, ReclassRule, Reclassify,
        ReclassifyParams, Sector, Unmatched,
    };
    pub use crate::conversion::{rasterize, resample_to_extent, Rasterize, RasterizeParams};
    pub use crate::exposure::{
        DirectionalExposure, EvaluatorParams, ExposureEvaluator, ExposureLayers, ExposureOutcome,
        ExposureResult, OceanLayer, PointContext, Stage,
    };
    pub use crate::statistics::{aggregate, SectorStatistics, SectorTable};
    pub use crate::visibility::{viewshed, Viewshed, ViewshedParams};
    pub use coastview_core::prelude::*;
}
