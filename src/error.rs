//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, granule reader, GDAL and netCDF errors, and provides semantic
//! variants for input validation and processing failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Granule reader error: {0}")]
    Swot(#[from] crate::io::SwotError),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Shape mismatch for {what}: expected {expected}, got {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: String,
        found: String,
    },

    #[error("Swath has {columns} cross-track columns, at least 3 are required for border extrapolation")]
    SwathTooNarrow { columns: usize },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Per-date masks do not share one grid: {0}")]
    GridMismatch(String),

    #[error("No mask files found in {0}")]
    NoInputs(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }

    /// Input geometry that can never produce a mask, as opposed to a file that failed to read
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::ShapeMismatch { .. } | Error::SwathTooNarrow { .. } | Error::InvalidGrid(_)
        )
    }

    pub(crate) fn shape_mismatch(
        what: &'static str,
        expected: impl std::fmt::Debug,
        found: impl std::fmt::Debug,
    ) -> Self {
        Error::ShapeMismatch {
            what,
            expected: format!("{:?}", expected),
            found: format!("{:?}", found),
        }
    }
}
