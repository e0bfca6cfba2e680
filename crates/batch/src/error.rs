//! Error types for batch runs

use thiserror::Error;

/// Errors that stop a batch session.
///
/// Per-point analysis failures never show up here; they are written to the
/// output as unavailable rows.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Core(#[from] coastview_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, BatchError>;
