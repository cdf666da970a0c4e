use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("participant id '{0}' doesn't conform to expected form")]
    InvalidParticipantId(String),
    #[error("participant id prefix '{0}' must be two uppercase ASCII letters")]
    InvalidPrefix(String),
    #[error("invalid anchor pattern for field '{field}': {source}")]
    InvalidAnchor {
        field: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
