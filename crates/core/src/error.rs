//! Error types for coastal exposure analysis

use thiserror::Error;

/// Main error type for raster and geometry operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    /// Malformed or unusable input features
    #[error("Input geometry error: {0}")]
    InputGeometry(String),

    /// The observer does not fall inside the analysis grid
    #[error("Observer at ({x}, {y}) lies outside the grid extent")]
    DegenerateObserver { x: f64, y: f64 },

    #[error("Extent has zero area: ({min_x}, {min_y}) - ({max_x}, {max_y}) at cell size {cell_size}")]
    EmptyExtent {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        cell_size: f64,
    },

    /// A computation produced NaN or infinity
    #[error("Numeric fault: {0}")]
    NumericFault(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error only affects the point being analysed.
    ///
    /// Recoverable errors are reported as an unavailable result for that
    /// point; the rest of a batch keeps running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InputGeometry(_)
                | Error::DegenerateObserver { .. }
                | Error::EmptyExtent { .. }
                | Error::NumericFault(_)
                | Error::IndexOutOfBounds { .. }
                | Error::SizeMismatch { .. }
                | Error::InvalidDimensions { .. }
                | Error::Algorithm(_)
        )
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
