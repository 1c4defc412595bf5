use std::path::Path;

use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_categories(db_path: &Path) -> Result<(), CliError> {
    let quotes = open_store(db_path)?.load_or_seed()?;
    for category in quotes.categories() {
        println!("{category}");
    }
    Ok(())
}
