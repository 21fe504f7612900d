//! Error types for rewind-movement

use thiserror::Error;

/// Movement configuration error
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid movement tuning: {0}")]
    InvalidTuning(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
