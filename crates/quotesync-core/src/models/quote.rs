//! Quote model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

const LOCAL_ID_PREFIX: &str = "local-";
const REMOTE_ID_PREFIX: &str = "remote-";

/// Stable identifier of a quote within a local set.
///
/// Locally created quotes get `local-<uuid v7>`; quotes materialized from the
/// remote side get `remote-<remote id>` so the same remote item always maps to
/// the same local id across syncs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    /// Create a new unique id for a locally originated quote
    #[must_use]
    pub fn new_local() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", Uuid::now_v7()))
    }

    /// Derive the local id for a remote item
    #[must_use]
    pub fn from_remote(remote_id: &RemoteId) -> Self {
        Self(format!("{REMOTE_ID_PREFIX}{remote_id}"))
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QuoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("quote id must not be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Identifier assigned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for RemoteId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RemoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side last authored a quote's field values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    #[serde(alias = "server")]
    Remote,
}

impl Origin {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl FromStr for Origin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" | "server" => Ok(Self::Remote),
            other => Err(Error::InvalidInput(format!("unknown quote origin '{other}'"))),
        }
    }
}

/// Whether a quote's current values were acknowledged by the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Pending,
    Synced,
}

impl SyncState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
        }
    }
}

impl FromStr for SyncState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "synced" => Ok(Self::Synced),
            other => Err(Error::InvalidInput(format!("unknown sync state '{other}'"))),
        }
    }
}

/// Field values a quote held before a merge overwrote them.
///
/// Only present while a conflict from the latest merge is unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictBackup {
    pub text: String,
    pub category: String,
    pub origin: Origin,
    pub sync_state: SyncState,
    pub remote_ref: Option<RemoteId>,
    pub updated_at: i64,
}

/// A quote in the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Unique identifier
    pub id: QuoteId,
    /// Quote body; merge key (case-insensitive)
    pub text: String,
    /// Free-form label
    pub category: String,
    pub origin: Origin,
    pub sync_state: SyncState,
    /// Last modification timestamp (Unix ms)
    pub updated_at: i64,
    /// Remote-side identifier once pushed or pulled
    #[serde(default)]
    pub remote_ref: Option<RemoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<ConflictBackup>,
}

impl QuoteRecord {
    /// Create a locally authored quote awaiting its first push
    #[must_use]
    pub fn new_local(text: impl Into<String>, category: impl Into<String>, now: i64) -> Self {
        Self {
            id: QuoteId::new_local(),
            text: text.into(),
            category: category.into(),
            origin: Origin::Local,
            sync_state: SyncState::Pending,
            updated_at: now,
            remote_ref: None,
            backup: None,
        }
    }

    /// Materialize a quote from a remote item
    #[must_use]
    pub fn from_remote(
        remote_id: RemoteId,
        text: impl Into<String>,
        category: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            id: QuoteId::from_remote(&remote_id),
            text: text.into(),
            category: category.into(),
            origin: Origin::Remote,
            sync_state: SyncState::Synced,
            updated_at: now,
            remote_ref: Some(remote_id),
            backup: None,
        }
    }

    /// Local quote the remote side has not acknowledged yet
    #[must_use]
    pub fn is_pending_push(&self) -> bool {
        self.origin == Origin::Local && self.sync_state == SyncState::Pending
    }

    /// Case-insensitive comparison against another quote body
    #[must_use]
    pub fn text_matches(&self, text: &str) -> bool {
        self.text.to_lowercase() == text.to_lowercase()
    }

    /// Snapshot the current field values
    #[must_use]
    pub fn snapshot(&self) -> ConflictBackup {
        ConflictBackup {
            text: self.text.clone(),
            category: self.category.clone(),
            origin: self.origin,
            sync_state: self.sync_state,
            remote_ref: self.remote_ref.clone(),
            updated_at: self.updated_at,
        }
    }

    /// Put backed-up field values back onto the record
    pub fn restore(&mut self, backup: ConflictBackup) {
        self.text = backup.text;
        self.category = backup.category;
        self.origin = backup.origin;
        self.sync_state = backup.sync_state;
        self.remote_ref = backup.remote_ref;
        self.updated_at = backup.updated_at;
    }

    /// Record a successful push acknowledged as `remote_id`
    pub fn mark_pushed(&mut self, remote_id: RemoteId, now: i64) {
        self.sync_state = SyncState::Synced;
        self.remote_ref = Some(remote_id);
        self.updated_at = now;
    }

    /// Take remote-authored values; stays pending if there is no remote ref
    /// to be synced against.
    pub fn adopt_remote(&mut self, category: &str, remote_ref: Option<&RemoteId>) {
        self.category = category.to_string();
        self.origin = Origin::Remote;
        if let Some(remote_ref) = remote_ref {
            self.remote_ref = Some(remote_ref.clone());
        }
        self.sync_state = if self.remote_ref.is_some() {
            SyncState::Synced
        } else {
            SyncState::Pending
        };
    }
}
