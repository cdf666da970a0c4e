//! Error types for identity resolution and reconciliation.

use thiserror::Error;

use nps_ingest::IngestError;
use nps_model::ModelError;

/// Errors that abort a harvesting run.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The two copies of a participant id embedded in a linked-study path disagree.
    #[error("participant ids embedded in {path} don't match ({directory} vs {file})")]
    IdentityMismatch {
        path: String,
        directory: String,
        file: String,
    },

    /// A participant id reaching normalization is malformed.
    #[error("cannot normalize participant id of {source_path}: {source}")]
    Normalize {
        source_path: String,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("failed to build output table: {0}")]
    Frame(#[from] polars::prelude::PolarsError),

    #[error("failed to write output {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TransformError>;
