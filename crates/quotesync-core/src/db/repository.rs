//! Quote persistence sink and its `SQLite` implementation

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection};

use super::connection::Database;
use super::meta_repository::MetaRepository;
use crate::error::{Error, Result};
use crate::models::{Conflict, ConflictBackup, QuoteRecord, QuoteSet, RemoteId};
use crate::util::now_millis;

/// Durable storage for the full local quote set.
///
/// `save` replaces everything previously stored; callers always hand over the
/// complete set.
pub trait QuoteStore: Send + Sync {
    /// Load the last saved set
    fn load(&self) -> Result<QuoteSet>;

    /// Replace the stored set
    fn save(&self, quotes: &QuoteSet) -> Result<()>;
}

impl<T: QuoteStore + ?Sized> QuoteStore for Arc<T> {
    fn load(&self) -> Result<QuoteSet> {
        (**self).load()
    }

    fn save(&self, quotes: &QuoteSet) -> Result<()> {
        (**self).save(quotes)
    }
}

/// `SQLite` implementation of `QuoteStore`.
///
/// Also keeps the open conflicts of the most recent sync and small UI
/// metadata so separate CLI invocations can pick them up.
pub struct SqliteQuoteStore {
    db: Mutex<Database>,
}

impl SqliteQuoteStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Load the set, writing the default quotes first if the store was never
    /// seeded.
    pub fn load_or_seed(&self) -> Result<QuoteSet> {
        let mut db = self.lock()?;
        if MetaRepository::new(db.connection()).is_seeded()? {
            return load_quotes(db.connection());
        }

        let existing = load_quotes(db.connection())?;
        let quotes = if existing.is_empty() {
            tracing::info!("Seeding quote store with default quotes");
            QuoteSet::seeded(now_millis())
        } else {
            existing
        };

        let tx = db.connection_mut().transaction()?;
        replace_quotes(&tx, &quotes)?;
        MetaRepository::new(&tx).mark_seeded()?;
        tx.commit()?;
        Ok(quotes)
    }

    /// Open conflicts recorded by the most recent sync, in detection order
    pub fn open_conflicts(&self) -> Result<Vec<Conflict>> {
        let db = self.lock()?;
        let mut stmt = db.connection().prepare(
            "SELECT local_id, text, local_category_before, remote_category, remote_record
             FROM conflicts ORDER BY position",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(
                |(local_id, text, local_category_before, remote_category, remote_record)| -> Result<Conflict> {
                    Ok(Conflict {
                        text,
                        local_category_before,
                        remote_category,
                        local_id: local_id.parse()?,
                        remote_record: serde_json::from_str(&remote_record)?,
                    })
                },
            )
            .collect()
    }

    /// Replace the open conflict list with the latest sync's conflicts
    pub fn replace_conflicts(&self, conflicts: &[Conflict]) -> Result<()> {
        let mut db = self.lock()?;
        let tx = db.connection_mut().transaction()?;
        tx.execute("DELETE FROM conflicts", [])?;
        let detected_at = now_millis();
        for (position, conflict) in conflicts.iter().enumerate() {
            tx.execute(
                "INSERT OR REPLACE INTO conflicts
                 (local_id, position, text, local_category_before, remote_category, remote_record, detected_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    conflict.local_id.as_str(),
                    i64::try_from(position).unwrap_or(i64::MAX),
                    conflict.text,
                    conflict.local_category_before,
                    conflict.remote_category,
                    serde_json::to_string(&conflict.remote_record)?,
                    detected_at,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Drop conflicts that were resolved
    pub fn remove_conflicts<'a>(
        &self,
        local_ids: impl IntoIterator<Item = &'a crate::models::QuoteId>,
    ) -> Result<usize> {
        let mut db = self.lock()?;
        let tx = db.connection_mut().transaction()?;
        let mut removed = 0;
        for local_id in local_ids {
            removed += tx.execute(
                "DELETE FROM conflicts WHERE local_id = ?",
                params![local_id.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Run `f` against the metadata table
    pub fn with_meta<T>(&self, f: impl FnOnce(&MetaRepository<'_>) -> Result<T>) -> Result<T> {
        let db = self.lock()?;
        f(&MetaRepository::new(db.connection()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| Error::Storage("quote store lock poisoned".to_string()))
    }
}

impl QuoteStore for SqliteQuoteStore {
    fn load(&self) -> Result<QuoteSet> {
        let db = self.lock()?;
        load_quotes(db.connection())
    }

    fn save(&self, quotes: &QuoteSet) -> Result<()> {
        let mut db = self.lock()?;
        let tx = db.connection_mut().transaction()?;
        replace_quotes(&tx, quotes)?;
        tx.commit()?;
        tracing::debug!("Saved {} quotes", quotes.len());
        Ok(())
    }
}

/// Raw row values before enum/JSON decoding
struct QuoteRow {
    id: String,
    text: String,
    category: String,
    origin: String,
    sync_state: String,
    updated_at: i64,
    remote_ref: Option<String>,
    backup: Option<String>,
}

impl QuoteRow {
    fn parse(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            category: row.get(2)?,
            origin: row.get(3)?,
            sync_state: row.get(4)?,
            updated_at: row.get(5)?,
            remote_ref: row.get(6)?,
            backup: row.get(7)?,
        })
    }

    fn into_record(self) -> Result<QuoteRecord> {
        let backup = self
            .backup
            .as_deref()
            .map(serde_json::from_str::<ConflictBackup>)
            .transpose()?;
        Ok(QuoteRecord {
            id: self.id.parse()?,
            text: self.text,
            category: self.category,
            origin: self.origin.parse()?,
            sync_state: self.sync_state.parse()?,
            updated_at: self.updated_at,
            remote_ref: self.remote_ref.map(RemoteId::new),
            backup,
        })
    }
}

fn load_quotes(conn: &Connection) -> Result<QuoteSet> {
    let mut stmt = conn.prepare(
        "SELECT id, text, category, origin, sync_state, updated_at, remote_ref, backup
         FROM quotes ORDER BY position",
    )?;
    let rows = stmt
        .query_map([], QuoteRow::parse)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let records = rows
        .into_iter()
        .map(QuoteRow::into_record)
        .collect::<Result<Vec<_>>>()?;
    Ok(QuoteSet::from_records(records))
}

fn replace_quotes(conn: &Connection, quotes: &QuoteSet) -> Result<()> {
    conn.execute("DELETE FROM quotes", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO quotes
         (id, position, text, category, origin, sync_state, updated_at, remote_ref, backup)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )?;
    for (position, quote) in quotes.iter().enumerate() {
        let backup = quote
            .backup
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        stmt.execute(params![
            quote.id.as_str(),
            i64::try_from(position).unwrap_or(i64::MAX),
            quote.text,
            quote.category,
            quote.origin.as_str(),
            quote.sync_state.as_str(),
            quote.updated_at,
            quote.remote_ref.as_ref().map(RemoteId::as_str),
            backup,
        ])?;
    }
    Ok(())
}
