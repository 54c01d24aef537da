use std::path::PathBuf;
use thiserror::Error;

use crate::models::Category;

/// All errors produced by the dashboard crates.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be decoded.
    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A source file lacks a column required to compute the row total.
    #[error("{category} file {path} is missing required column `{column}`")]
    Schema {
        category: Category,
        path: PathBuf,
        column: String,
    },

    /// A pincode search term is not a 6-digit postal code.
    #[error("Invalid pincode: {0}")]
    InvalidPincode(String),

    /// The expected data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// `true` for errors that must abort a category load instead of
    /// skipping the offending file.
    pub fn is_fatal_for_load(&self) -> bool {
        matches!(self, DashboardError::Schema { .. })
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
