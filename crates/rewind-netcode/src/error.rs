//! Error types for rewind-netcode

use rewind_core::Tick;
use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Authoritative state for a tick that was never predicted locally
    ///
    /// The caller delivered a snapshot from the future, which means its tick
    /// loop or message routing is broken.
    #[error("Authoritative snapshot for tick {tick} is ahead of predicted tick {newest}")]
    AuthoritativeFromFuture { tick: Tick, newest: Tick },

    /// Command is not newer than what was already queued or consumed
    #[error("Command for tick {tick} arrived out of order, tick {floor} already taken")]
    CommandOutOfOrder { tick: Tick, floor: Tick },

    /// A retained tick has no command to replay
    #[error("No command retained for tick {0}")]
    MissingCommand(Tick),

    /// Inbox hand-off is at capacity
    #[error("Inbox full, cannot hand off more messages")]
    InboxFull,

    /// Receiving driver has been torn down
    #[error("Inbox closed, the driver was disconnected or dropped")]
    InboxClosed,

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration parse error
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// History buffer error
    #[error("History error: {0}")]
    History(#[from] rewind_history::Error),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] rewind_core::Error),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
