//! Error types for rewind-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid tick rate: {0} Hz")]
    InvalidTickRate(u32),

    #[error("Invalid divergence policy: {0}")]
    InvalidPolicy(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
