//! Error types for the records-system client.

use thiserror::Error;

/// Errors that can occur while talking to the records system.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RedcapError {
    /// Request could not be sent or its response read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The records system rejected an import.
    #[error("import rejected: {message}")]
    Rejected { message: String },

    /// Unexpected HTTP status.
    #[error("records API returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("failed to decode records API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RedcapError {
    /// Whether a retry might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Rejected { .. } | Self::Decode(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RedcapError>;
