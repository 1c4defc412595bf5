use std::path::Path;

use quotesync_core::db::QuoteStore;
use quotesync_core::util::now_millis;

use crate::commands::common::{open_store, resolve_quote_text};
use crate::error::CliError;

pub fn run_add(text_parts: &[String], category: &str, db_path: &Path) -> Result<(), CliError> {
    let text = resolve_quote_text(text_parts)?;

    let store = open_store(db_path)?;
    let mut quotes = store.load_or_seed()?;
    let id = quotes.add_quote(&text, category, now_millis())?.id.clone();
    store.save(&quotes)?;

    println!("{id}");
    Ok(())
}
