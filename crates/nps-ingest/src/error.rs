//! Error types for spreadsheet ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while walking a source tree or loading a grid.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry is not known to the source.
    #[error("entry not found in source: {path}")]
    EntryNotFound { path: String },

    // === Spreadsheet Errors ===
    /// Workbook could not be opened or its first sheet read.
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: String, message: String },

    /// Workbook has no sheets.
    #[error("workbook has no sheets: {path}")]
    NoSheets { path: String },

    /// Failed to parse a CSV grid.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: String, message: String },

    /// File extension is not a supported spreadsheet format.
    #[error("unsupported spreadsheet format: {path}")]
    UnsupportedFormat { path: String },

    // === Pattern Errors ===
    /// Walk pattern is not a valid regular expression.
    #[error("invalid {kind} pattern '{pattern}': {source}")]
    Pattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
