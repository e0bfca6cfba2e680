//! Vector-to-raster and raster-to-grid conversion
//!
//! - **rasterize**: burn point/polygon features into an analysis grid
//! - **resample**: sample an existing raster layer onto an analysis grid

mod rasterize;
mod resample;

pub use rasterize::{rasterize, Rasterize, RasterizeParams};
pub use resample::resample_to_extent;
