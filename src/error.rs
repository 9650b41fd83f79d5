//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, GDAL, JSON, CSV, HTTP and Parquet errors, and provides
//! semantic variants that carry the offending paths or column names.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed input {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Empty collection produced! Possible wrong folder? Attempted {} path(s): {paths:?}", paths.len())]
    EmptyResult { paths: Vec<PathBuf> },

    #[error("The provided collection is missing required columns: {missing:?}")]
    MissingColumns { missing: Vec<String> },

    #[error("Reference data unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Column `{column}` is not of type {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub fn malformed<P: Into<PathBuf>, E: std::fmt::Display>(path: P, reason: E) -> Self {
        Error::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
