//! Sync conflict model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::quote::{QuoteId, QuoteRecord};

/// Local/remote pair with matching text but differing category.
///
/// The remote values are already applied when this is reported; it exists so
/// the caller can optionally override that default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Quote body as seen on the remote side
    pub text: String,
    /// Category the local quote had before the merge
    pub local_category_before: String,
    /// Category the remote side holds
    pub remote_category: String,
    /// Local quote the merge overwrote
    pub local_id: QuoteId,
    /// Remote record as fetched
    pub remote_record: QuoteRecord,
}

/// Manual override choice for a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    KeepLocal,
    KeepRemote,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepLocal => f.write_str("local"),
            Self::KeepRemote => f.write_str("remote"),
        }
    }
}
