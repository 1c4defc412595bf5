//! quotes - Command-line interface for quotesync
//!
//! Keep a quote collection locally and reconcile it with a remote store.

mod cli;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::categories::run_categories;
use crate::commands::common::{load_settings, resolve_config_path, resolve_db_path};
use crate::commands::config::run_config;
use crate::commands::export::{run_export, run_import};
use crate::commands::list::run_list;
use crate::commands::random::{run_last_or_random, run_random};
use crate::commands::sync::{run_conflicts, run_resolve, run_sync};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::from_default_env();
    let filter = match "quotes=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;
    let config_path = resolve_config_path(cli.config)?;

    match cli.command {
        Some(Commands::Add { text, category }) => run_add(&text, &category, &db_path)?,
        Some(Commands::List { category, json }) => {
            run_list(category.as_deref(), json, &db_path)?;
        }
        Some(Commands::Random { category }) => run_random(category.as_deref(), &db_path)?,
        Some(Commands::Categories) => run_categories(&db_path)?,
        Some(Commands::Export { output }) => run_export(output.as_deref(), &db_path)?,
        Some(Commands::Import { path }) => run_import(&path, &db_path)?,
        Some(Commands::Sync { watch }) => {
            let settings = load_settings(&config_path)?;
            run_sync(&settings, watch, &db_path).await?;
        }
        Some(Commands::Conflicts { json }) => run_conflicts(json, &db_path)?,
        Some(Commands::Resolve { target, keep }) => {
            let settings = load_settings(&config_path)?;
            run_resolve(&target, keep.into(), &settings, &db_path).await?;
        }
        Some(Commands::Config { command }) => run_config(command, &config_path)?,
        // Bare invocation picks up where the last session left off
        None => run_last_or_random(&db_path)?,
    }

    Ok(())
}
