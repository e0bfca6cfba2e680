//! # Coastview Core
//!
//! Core types, traits and I/O for coastal line-of-sight exposure analysis.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type
//! - `GeoTransform` and `Extent`: georeferencing for per-point analysis windows
//! - Vector features and `PropertyPoint`s that get burned into grids
//! - The error taxonomy shared by every analysis stage
//! - GeoTIFF I/O for land/ocean layers and debug dumps

pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use raster::{Extent, GeoTransform, Raster, RasterElement};
pub use vector::{AttributeValue, Feature, FeatureCollection, PropertyPoint};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Extent, GeoTransform, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection, PropertyPoint};
    pub use crate::Algorithm;
}

/// Core trait for analysis stages.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
