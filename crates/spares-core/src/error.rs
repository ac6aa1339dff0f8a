//! Error types for spares-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in spares-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Spreadsheet could not be opened or a sheet could not be read
    #[error("failed to read workbook '{path}': {message}")]
    Workbook { path: PathBuf, message: String },

    /// Writing the output workbook failed
    #[error("failed to write workbook: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    /// File extension not recognised as a sheet source
    #[error("unsupported file format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Source contained no sheets at all
    #[error("no sheets found in '{0}'")]
    NoSheets(PathBuf),

    /// A required field has no header above the similarity floor
    #[error("Could not find a match for required column: '{field}'")]
    SchemaMismatch { field: String },

    /// The reference table lacks one of its fixed columns
    #[error("column '{column}' not found in sheet '{sheet}'")]
    ReferenceColumnMissing { sheet: String, column: String },

    /// The reference equipment table could not be loaded
    #[error("reference data unavailable from '{path}': {message}")]
    ReferenceUnavailable { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
