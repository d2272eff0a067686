use thiserror::Error;

/// Errors shared by every Paradise crate.
#[derive(Error, Debug)]
pub enum ParadiseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {reason}")]
    Parse { reason: String },

    #[error("Unknown relation type: {0:?}")]
    UnknownRelationType(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ParadiseError>;
