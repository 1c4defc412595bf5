//! Data models for quotesync

mod conflict;
mod quote;
mod quote_set;

pub use conflict::{Conflict, Resolution};
pub use quote::{ConflictBackup, Origin, QuoteId, QuoteRecord, RemoteId, SyncState};
pub use quote_set::{QuoteSet, ALL_CATEGORIES};
