//! # Coastview Batch
//!
//! Resumable evaluation of coastal exposure over a point dataset.
//!
//! - **config**: Session settings and their startup validation
//! - **input**: CSV points and GeoTIFF land/ocean layers
//! - **index** / **context**: Neighbor lookup and per-point context
//! - **checkpoint**: Durable log of processed identifiers
//! - **sink**: CSV output rows
//! - **session** / **driver**: Counters and the chunked parallel run loop

pub mod checkpoint;
pub mod config;
pub mod context;
pub mod driver;
pub mod dump;
pub mod error;
pub mod index;
pub mod input;
pub mod session;
pub mod sink;
pub mod strategy;

pub use checkpoint::Checkpoint;
pub use config::BatchConfig;
pub use driver::BatchDriver;
pub use error::{BatchError, Result};
pub use index::PointIndex;
pub use input::{read_ocean, read_points, read_points_from};
pub use session::{Session, SessionSummary};
pub use sink::ResultSink;
pub use strategy::{Executor, ProcessingMode};
