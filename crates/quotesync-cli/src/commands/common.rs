use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use chrono::Utc;
use quotesync_core::db::SqliteQuoteStore;
use quotesync_core::models::{Conflict, QuoteRecord};
use quotesync_core::SyncSettings;
use serde::Serialize;

use crate::error::CliError;

const APP_DIR: &str = "quotesync";
const DB_PATH_ENV: &str = "QUOTESYNC_DB_PATH";
const CONFIG_PATH_ENV: &str = "QUOTESYNC_CONFIG";

#[derive(Debug, Serialize)]
pub struct QuoteListItem {
    pub id: String,
    pub text: String,
    pub category: String,
    pub origin: String,
    pub sync_state: String,
    pub remote_id: Option<String>,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct ConflictItem {
    pub local_id: String,
    pub text: String,
    pub local_category_before: String,
    pub remote_category: String,
    pub remote_id: Option<String>,
}

pub fn quote_to_list_item(quote: &QuoteRecord) -> QuoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    QuoteListItem {
        id: quote.id.to_string(),
        text: quote.text.clone(),
        category: quote.category.clone(),
        origin: quote.origin.as_str().to_string(),
        sync_state: quote.sync_state.as_str().to_string(),
        remote_id: quote.remote_ref.as_ref().map(ToString::to_string),
        updated_at: quote.updated_at,
        relative_time: format_relative_time(quote.updated_at, now_ms),
    }
}

pub fn conflict_to_item(conflict: &Conflict) -> ConflictItem {
    ConflictItem {
        local_id: conflict.local_id.to_string(),
        text: conflict.text.clone(),
        local_category_before: conflict.local_category_before.clone(),
        remote_category: conflict.remote_category.clone(),
        remote_id: conflict
            .remote_record
            .remote_ref
            .as_ref()
            .map(ToString::to_string),
    }
}

pub fn format_quote_lines<'a>(quotes: impl IntoIterator<Item = &'a QuoteRecord>) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    quotes
        .into_iter()
        .map(|quote| {
            let preview = text_preview(&quote.text, 48);
            let relative_time = format_relative_time(quote.updated_at, now_ms);
            format!(
                "{}  {:<16}  {:<7}  {preview:<48}  {relative_time}",
                quote.id,
                quote.category,
                quote.sync_state.as_str(),
            )
        })
        .collect()
}

pub fn format_conflict_lines(conflicts: &[Conflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  local={}  remote={}  {}",
                conflict.local_id,
                conflict.local_category_before,
                conflict.remote_category,
                text_preview(&conflict.text, 48)
            )
        })
        .collect()
}

pub fn text_preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn resolve_quote_text(text_parts: &[String]) -> Result<String, CliError> {
    if let Some(text) = normalize_content(&text_parts.join(" ")) {
        return Ok(text);
    }

    if let Some(text) = read_piped_stdin()? {
        return Ok(text);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// Pick open conflicts by exact local id, unique id prefix, or `all`.
pub fn select_conflicts(conflicts: &[Conflict], target: &str) -> Result<Vec<Conflict>, CliError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(CliError::EmptyQuoteId);
    }
    if target.eq_ignore_ascii_case("all") {
        return Ok(conflicts.to_vec());
    }

    if let Some(exact) = conflicts
        .iter()
        .find(|conflict| conflict.local_id.as_str() == target)
    {
        return Ok(vec![exact.clone()]);
    }

    let matching = conflicts
        .iter()
        .filter(|conflict| conflict.local_id.as_str().starts_with(target))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::ConflictNotFound(target.to_string())),
        [single] => Ok(vec![(*single).clone()]),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|conflict| conflict.local_id.to_string())
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousQuoteId(format!(
                "ID prefix '{target}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join("quotes.db"))
        .ok_or(CliError::MissingDirectory("data"))
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) =
        cli_config_path.or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    {
        return Ok(path);
    }
    default_config_path()
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join("config.json"))
        .ok_or(CliError::MissingDirectory("config"))
}

/// Settings file contents with environment overrides applied
pub fn load_settings(path: &Path) -> Result<SyncSettings, CliError> {
    let settings = SyncSettings::load_from_path(path)?.with_env_overrides();
    settings.validate()?;
    Ok(settings)
}

pub fn open_store(path: &Path) -> Result<SqliteQuoteStore, CliError> {
    Ok(SqliteQuoteStore::open(path)?)
}
