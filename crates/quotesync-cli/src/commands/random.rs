use std::path::Path;

use quotesync_core::db::SqliteQuoteStore;
use quotesync_core::QuoteRecord;

use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_random(category: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    print_quote(pick_random_quote(&store, category)?.as_ref());
    Ok(())
}

/// Show the quote shown last time, or a fresh pick when there is none.
pub fn run_last_or_random(db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let quote = match remembered_quote(&store)? {
        Some(quote) => Some(quote),
        None => pick_random_quote(&store, None)?,
    };
    print_quote(quote.as_ref());
    Ok(())
}

fn print_quote(quote: Option<&QuoteRecord>) {
    match quote {
        Some(quote) => println!("\"{}\"\n  - {}", quote.text, quote.category),
        None => println!("No quotes available for this category."),
    }
}

/// Last shown quote, if it is still in the collection
pub fn remembered_quote(store: &SqliteQuoteStore) -> Result<Option<QuoteRecord>, CliError> {
    let Some(id) = store.with_meta(|meta| meta.last_quote_id())? else {
        return Ok(None);
    };
    Ok(store.load_or_seed()?.get(&id).cloned())
}

/// Pick a quote from `category`, or from the remembered category when none
/// is given. An explicit category becomes the remembered one.
pub fn pick_random_quote(
    store: &SqliteQuoteStore,
    category: Option<&str>,
) -> Result<Option<QuoteRecord>, CliError> {
    let quotes = store.load_or_seed()?;
    let category = match category.map(str::trim).filter(|value| !value.is_empty()) {
        Some(category) => {
            store.with_meta(|meta| meta.set_selected_category(category))?;
            Some(category.to_string())
        }
        None => store.with_meta(|meta| meta.selected_category())?,
    };

    let mut rng = rand::thread_rng();
    let Some(quote) = quotes.random_quote(category.as_deref(), &mut rng).cloned() else {
        return Ok(None);
    };
    store.with_meta(|meta| meta.set_last_quote_id(&quote.id))?;
    Ok(Some(quote))
}
