use std::path::Path;

use quotesync_core::db::QuoteStore;
use quotesync_core::export::{import_json, render_json_export, ImportSummary};
use quotesync_core::util::now_millis;

use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_export(output_path: Option<&Path>, db_path: &Path) -> Result<(), CliError> {
    let quotes = open_store(db_path)?.load_or_seed()?;
    let rendered = render_json_export(&quotes)?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

pub fn run_import(input_path: &Path, db_path: &Path) -> Result<(), CliError> {
    let summary = import_file(input_path, db_path)?;
    println!(
        "Imported {} quote(s); skipped {}.",
        summary.imported, summary.skipped
    );
    Ok(())
}

pub fn import_file(input_path: &Path, db_path: &Path) -> Result<ImportSummary, CliError> {
    let payload = std::fs::read_to_string(input_path)?;

    let store = open_store(db_path)?;
    let mut quotes = store.load_or_seed()?;
    let summary = import_json(&mut quotes, &payload, now_millis())?;
    if summary.imported > 0 {
        store.save(&quotes)?;
    }
    Ok(summary)
}
