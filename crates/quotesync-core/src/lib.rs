//! quotesync-core - Core library for quotesync
//!
//! This crate contains the quote models, the SQLite store, the remote
//! gateway, and the reconciliation engine shared by quotesync interfaces.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod gateway;
pub mod models;
pub mod reconcile;
pub mod scheduler;
pub mod state;
pub mod util;

pub use config::SyncSettings;
pub use error::{Error, Result};
pub use gateway::{HttpRemoteGateway, RemoteGateway, RemoteItem};
pub use models::{Conflict, QuoteId, QuoteRecord, QuoteSet, Resolution};
pub use reconcile::{SyncEngine, SyncReport};
pub use scheduler::{CycleOutcome, SyncScheduler};
