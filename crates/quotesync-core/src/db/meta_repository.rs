//! Key/value metadata repository

use crate::error::Result;
use crate::models::QuoteId;
use rusqlite::{params, Connection, OptionalExtension};

const SEEDED_KEY: &str = "seeded";
const SELECTED_CATEGORY_KEY: &str = "selected_category";
const LAST_QUOTE_KEY: &str = "last_quote_id";

/// `SQLite` access to the `meta` table
pub struct MetaRepository<'a> {
    conn: &'a Connection,
}

impl<'a> MetaRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Whether the default quotes were ever written
    pub fn is_seeded(&self) -> Result<bool> {
        Ok(self
            .get(SEEDED_KEY)?
            .is_some_and(|value| matches!(value.as_str(), "1" | "true")))
    }

    pub fn mark_seeded(&self) -> Result<()> {
        self.set(SEEDED_KEY, "1")
    }

    /// Category filter remembered from the last random pick
    pub fn selected_category(&self) -> Result<Option<String>> {
        self.get(SELECTED_CATEGORY_KEY)
    }

    pub fn set_selected_category(&self, category: &str) -> Result<()> {
        self.set(SELECTED_CATEGORY_KEY, category)
    }

    /// Quote shown most recently
    pub fn last_quote_id(&self) -> Result<Option<QuoteId>> {
        self.get(LAST_QUOTE_KEY)?
            .map(|value| value.parse())
            .transpose()
    }

    pub fn set_last_quote_id(&self, id: &QuoteId) -> Result<()> {
        self.set(LAST_QUOTE_KEY, id.as_str())
    }
}
