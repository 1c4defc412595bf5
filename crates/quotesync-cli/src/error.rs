use std::io;

use quotesync_core::gateway::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quotesync_core::Error),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No quote text provided")]
    EmptyContent,
    #[error("Quote ID cannot be empty")]
    EmptyQuoteId,
    #[error("No open conflict for id/prefix: {0}")]
    ConflictNotFound(String),
    #[error("{0}")]
    AmbiguousQuoteId(String),
    #[error("Failed to resolve {0} directory")]
    MissingDirectory(&'static str),
}
