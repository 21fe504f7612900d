//! Error types for rewind-history

use rewind_core::Tick;
use thiserror::Error;

/// History buffer error type
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Appended tick does not directly follow the newest entry
    #[error("Non-contiguous tick: expected {expected}, got {got}")]
    NonContiguousTick { expected: Tick, got: Tick },

    /// Tick is outside the retained window
    #[error("Tick {tick} is outside the retained window [{oldest}, {newest}]")]
    TickOutOfWindow { tick: Tick, oldest: Tick, newest: Tick },

    /// Buffer holds no entries
    #[error("History is empty")]
    Empty,
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, Error>;
