//! Error types shared across the biorecord crates

use thiserror::Error;

/// Result type alias for biorecord operations
pub type Result<T> = std::result::Result<T, BiorecordError>;

/// Workspace-level error type
///
/// Record decoding has its own, more detailed error in `biorecord-ingest`;
/// this type covers configuration, symbol parsing and serialization.
#[derive(Error, Debug)]
pub enum BiorecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported record format: {0}")]
    UnsupportedFormat(String),
}

impl BiorecordError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
