use std::path::Path;

use crate::commands::common::{format_quote_lines, open_store, quote_to_list_item, QuoteListItem};
use crate::error::CliError;

pub fn run_list(category: Option<&str>, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let quotes = open_store(db_path)?.load_or_seed()?;
    let selected = quotes.filter_by_category(category);

    if as_json {
        let json_items = selected
            .iter()
            .map(|quote| quote_to_list_item(quote))
            .collect::<Vec<QuoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if selected.is_empty() {
        println!("No quotes found.");
        return Ok(());
    }

    for line in format_quote_lines(selected) {
        println!("{line}");
    }
    Ok(())
}
