//! Persistence layer for quotesync

mod connection;
mod memory;
mod meta_repository;
mod migrations;
mod repository;

pub use connection::Database;
pub use memory::MemoryQuoteStore;
pub use meta_repository::MetaRepository;
pub use repository::{QuoteStore, SqliteQuoteStore};
