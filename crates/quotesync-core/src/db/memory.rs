//! In-memory persistence sink

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::repository::QuoteStore;
use crate::error::{Error, Result};
use crate::models::QuoteSet;

/// Keeps the last saved set in memory and counts saves.
#[derive(Debug, Default)]
pub struct MemoryQuoteStore {
    saved: Mutex<QuoteSet>,
    saves: AtomicUsize,
}

impl MemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already "durable" set
    pub fn with_quotes(quotes: QuoteSet) -> Self {
        Self {
            saved: Mutex::new(quotes),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl QuoteStore for MemoryQuoteStore {
    fn load(&self) -> Result<QuoteSet> {
        self.saved
            .lock()
            .map(|quotes| quotes.clone())
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }

    fn save(&self, quotes: &QuoteSet) -> Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))?;
        saved.clone_from(quotes);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
