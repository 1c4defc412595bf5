//! JSON import/export of quote collections.
//!
//! Files use camelCase field names (`source`, `synced`, `updatedAt`,
//! `serverId`) so they can be shared with the browser client.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Origin, QuoteId, QuoteRecord, QuoteSet, RemoteId, SyncState};
use crate::util::normalize_text_option;

/// Default file name offered by export flows.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "quotes.json";

const IMPORTED_CATEGORY: &str = "Imported";

/// Serializable quote representation used in JSON exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuote {
    pub id: String,
    pub text: String,
    pub category: String,
    pub source: String,
    pub synced: bool,
    pub updated_at: i64,
    pub server_id: Option<String>,
}

/// Convert a quote into its export record
#[must_use]
pub fn quote_to_export_item(quote: &QuoteRecord) -> ExportQuote {
    ExportQuote {
        id: quote.id.to_string(),
        text: quote.text.clone(),
        category: quote.category.clone(),
        source: quote.origin.as_str().to_string(),
        synced: quote.sync_state == SyncState::Synced,
        updated_at: quote.updated_at,
        server_id: quote.remote_ref.as_ref().map(ToString::to_string),
    }
}

/// Render quotes as pretty-printed JSON.
pub fn render_json_export(quotes: &QuoteSet) -> serde_json::Result<String> {
    let items = quotes
        .iter()
        .map(quote_to_export_item)
        .collect::<Vec<ExportQuote>>();
    serde_json::to_string_pretty(&items)
}

/// Counts from an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Entries without text, or whose id already exists
    pub skipped: usize,
}

/// Lenient shape for imported entries; everything but `text` may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportQuote {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, alias = "origin")]
    source: Option<String>,
    #[serde(default)]
    synced: Option<bool>,
    #[serde(default)]
    updated_at: Option<i64>,
    #[serde(default, alias = "remoteRef")]
    server_id: Option<serde_json::Value>,
}

impl ImportQuote {
    fn into_record(self, now: i64) -> Option<QuoteRecord> {
        let text = normalize_text_option(self.text)?;
        let category = normalize_text_option(self.category)
            .unwrap_or_else(|| IMPORTED_CATEGORY.to_string());
        let id = normalize_text_option(self.id)
            .and_then(|id| id.parse::<QuoteId>().ok())
            .unwrap_or_else(QuoteId::new_local);
        let origin = self
            .source
            .and_then(|source| source.parse::<Origin>().ok())
            .unwrap_or(Origin::Local);
        let remote_ref = match self.server_id {
            Some(serde_json::Value::Number(number)) => Some(RemoteId::new(number.to_string())),
            Some(serde_json::Value::String(value)) => {
                normalize_text_option(Some(value)).map(RemoteId::new)
            }
            _ => None,
        };
        // Synced without a remote counterpart is not a valid state
        let sync_state = if self.synced.unwrap_or(false) && remote_ref.is_some() {
            SyncState::Synced
        } else {
            SyncState::Pending
        };

        Some(QuoteRecord {
            id,
            text,
            category,
            origin,
            sync_state,
            updated_at: self.updated_at.unwrap_or(now),
            remote_ref,
            backup: None,
        })
    }
}

/// Parse an exported JSON array into quote records.
///
/// Entries without text are dropped; non-object entries are ignored.
pub fn parse_json_import(payload: &str, now: i64) -> Result<Vec<QuoteRecord>> {
    let value: serde_json::Value = serde_json::from_str(payload)?;
    let serde_json::Value::Array(entries) = value else {
        return Err(Error::InvalidInput("JSON must be an array".to_string()));
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<ImportQuote>(entry).ok())
        .filter_map(|entry| entry.into_record(now))
        .collect())
}

/// Import quotes from a JSON payload into `quotes`.
pub fn import_json(quotes: &mut QuoteSet, payload: &str, now: i64) -> Result<ImportSummary> {
    let value: serde_json::Value = serde_json::from_str(payload)?;
    let total = value.as_array().map_or(0, Vec::len);
    let records = parse_json_import(payload, now)?;

    let mut summary = ImportSummary {
        imported: 0,
        skipped: total - records.len(),
    };
    for record in records {
        let id = record.id.clone();
        if quotes.push(record) {
            summary.imported += 1;
        } else {
            tracing::debug!("Skipping imported quote {id}: id already present");
            summary.skipped += 1;
        }
    }
    Ok(summary)
}
