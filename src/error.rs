//! Error types for Trueno-PerfLog
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Only conditions without a defined degraded behavior become errors.
//! Malformed lines, missing timestamps and missing files are reported as
//! [`Diagnostic`](crate::ingest::Diagnostic)s instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trueno-PerfLog error types
#[derive(Error, Debug)]
pub enum Error {
    /// A run file could not be read at all
    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        /// Path of the unreadable file
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// Invalid ingestion configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid input to a library call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage error (Parquet/Arrow)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
