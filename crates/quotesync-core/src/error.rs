//! Error types for quotesync-core

use std::time::Duration;

use thiserror::Error;

use crate::gateway::GatewayError;

/// Result type alias using quotesync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quotesync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote fetch or push failed
    #[error("Transport error: {0}")]
    Transport(#[from] GatewayError),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistence sink failure not covered by the database variant
    #[error("Storage error: {0}")]
    Storage(String),

    /// Sync cycle exceeded its deadline
    #[error("Sync cycle timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Whether the error came from the remote side rather than local state.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}
