use std::path::Path;

use quotesync_core::db::SqliteQuoteStore;
use quotesync_core::reconcile::SYNC_FAILED_NOTICE;
use quotesync_core::{
    CycleOutcome, HttpRemoteGateway, RemoteGateway, Resolution, SyncEngine, SyncScheduler,
    SyncSettings,
};

use crate::commands::common::{
    conflict_to_item, format_conflict_lines, open_store, select_conflicts, ConflictItem,
};
use crate::error::CliError;

pub async fn run_sync(settings: &SyncSettings, watch: bool, db_path: &Path) -> Result<(), CliError> {
    let scheduler = build_scheduler(settings, db_path)?;

    if !watch {
        let outcome = scheduler.run_cycle().await;
        return match report_cycle(&scheduler, outcome) {
            Ok(line) => {
                println!("{line}");
                Ok(())
            }
            Err(error) => {
                print_failure_notice(&error);
                Err(error)
            }
        };
    }

    println!(
        "Syncing every {}s. Press Ctrl-C to stop.",
        settings.interval_secs
    );
    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {error}");
        }
    };
    scheduler
        .run_every(settings.interval(), shutdown, |outcome| {
            match report_cycle(&scheduler, outcome) {
                Ok(line) => println!("{line}"),
                Err(error) => {
                    tracing::warn!("Sync cycle failed: {error}");
                    print_failure_notice(&error);
                }
            }
        })
        .await;
    Ok(())
}

pub fn run_conflicts(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let conflicts = open_store(db_path)?.open_conflicts()?;

    if as_json {
        let json_items = conflicts
            .iter()
            .map(conflict_to_item)
            .collect::<Vec<ConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No open conflicts.");
        return Ok(());
    }

    for line in format_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_resolve(
    target: &str,
    resolution: Resolution,
    settings: &SyncSettings,
    db_path: &Path,
) -> Result<(), CliError> {
    let scheduler = build_scheduler(settings, db_path)?;
    for line in resolve_open_conflicts(&scheduler, target, resolution).await? {
        println!("{line}");
    }
    Ok(())
}

fn build_scheduler(
    settings: &SyncSettings,
    db_path: &Path,
) -> Result<SyncScheduler<HttpRemoteGateway, SqliteQuoteStore>, CliError> {
    let store = open_store(db_path)?;
    let quotes = store.load_or_seed()?;
    let gateway = HttpRemoteGateway::new(settings)?;
    Ok(SyncScheduler::new(
        SyncEngine::new(gateway, store),
        quotes,
        settings.timeout(),
    ))
}

/// Record a finished cycle's conflicts and describe the cycle in one line.
pub fn report_cycle<G: RemoteGateway>(
    scheduler: &SyncScheduler<G, SqliteQuoteStore>,
    outcome: quotesync_core::Result<CycleOutcome>,
) -> Result<String, CliError> {
    match outcome? {
        CycleOutcome::Completed(report) => {
            scheduler
                .engine()
                .store()
                .replace_conflicts(&report.conflicts)?;
            Ok(report.summary())
        }
        CycleOutcome::Skipped => Ok("Sync already in progress; skipped.".to_string()),
    }
}

/// Apply `resolution` to the open conflicts selected by `target`.
pub async fn resolve_open_conflicts<G: RemoteGateway>(
    scheduler: &SyncScheduler<G, SqliteQuoteStore>,
    target: &str,
    resolution: Resolution,
) -> Result<Vec<String>, CliError> {
    let store = scheduler.engine().store();
    let open = store.open_conflicts()?;
    if open.is_empty() {
        return Ok(vec!["No open conflicts.".to_string()]);
    }

    let selected = select_conflicts(&open, target)?;
    let resolutions = selected
        .iter()
        .map(|conflict| (conflict.clone(), resolution))
        .collect::<Vec<_>>();
    let updated = scheduler.resolve(&resolutions).await?;
    store.remove_conflicts(selected.iter().map(|conflict| &conflict.local_id))?;

    if updated.is_empty() {
        return Ok(vec!["Selected quotes no longer exist; conflicts cleared.".to_string()]);
    }
    Ok(updated
        .iter()
        .map(|quote| format!("{}  {}  (kept {resolution})", quote.id, quote.category))
        .collect())
}

fn print_failure_notice(error: &CliError) {
    let transport = match error {
        CliError::Core(error) => error.is_transport(),
        CliError::Gateway(_) => true,
        _ => false,
    };
    if transport {
        println!("{SYNC_FAILED_NOTICE}");
    }
}
