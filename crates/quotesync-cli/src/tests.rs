use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use quotesync_core::db::{QuoteStore, SqliteQuoteStore};
use quotesync_core::gateway::GatewayResult;
use quotesync_core::models::{Conflict, QuoteId, QuoteRecord, RemoteId};
use quotesync_core::{
    CycleOutcome, RemoteGateway, RemoteItem, Resolution, SyncEngine, SyncScheduler,
};

use crate::cli::KeepSide;
use crate::commands::add::run_add;
use crate::commands::common::{
    format_relative_time, load_settings, normalize_content, resolve_db_path, select_conflicts,
    text_preview,
};
use crate::commands::config::{run_config_set, SettingsUpdate};
use crate::commands::export::{import_file, run_export};
use crate::commands::random::{pick_random_quote, remembered_quote};
use crate::commands::sync::{report_cycle, resolve_open_conflicts};
use crate::error::CliError;

const SEEDED_WISDOM: &str = "In the middle of every difficulty lies opportunity.";

struct StaticGateway {
    items: Vec<RemoteItem>,
    next_id: AtomicI64,
}

impl StaticGateway {
    fn new(items: Vec<RemoteItem>) -> Self {
        Self {
            items,
            next_id: AtomicI64::new(100),
        }
    }
}

#[async_trait]
impl RemoteGateway for StaticGateway {
    async fn fetch_all(&self) -> GatewayResult<Vec<RemoteItem>> {
        Ok(self.items.clone())
    }

    async fn push_one(&self, _text: &str, _category: &str) -> GatewayResult<RemoteId> {
        Ok(RemoteId::from(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

fn test_scheduler(
    gateway: StaticGateway,
    db_path: &std::path::Path,
) -> SyncScheduler<StaticGateway, SqliteQuoteStore> {
    let store = SqliteQuoteStore::open(db_path).unwrap();
    let quotes = store.load_or_seed().unwrap();
    SyncScheduler::new(
        SyncEngine::new(gateway, store),
        quotes,
        Duration::from_secs(5),
    )
}

fn conflict_for(local_id: &str) -> Conflict {
    Conflict {
        text: "Be bold".to_string(),
        local_category_before: "A".to_string(),
        remote_category: "B".to_string(),
        local_id: local_id.parse().unwrap(),
        remote_record: QuoteRecord::from_remote(RemoteId::from(1), "Be bold", "B", 1),
    }
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn text_preview_collapses_whitespace_and_truncates() {
    assert_eq!(text_preview("Be   bold\nnow", 40), "Be bold now");
    assert_eq!(text_preview("abcdefghij", 8), "abcde...");
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn keep_side_maps_to_resolution() {
    assert_eq!(Resolution::from(KeepSide::Local), Resolution::KeepLocal);
    assert_eq!(Resolution::from(KeepSide::Remote), Resolution::KeepRemote);
}

#[test]
fn resolve_db_path_prefers_explicit_path() {
    let path = PathBuf::from("/tmp/custom.db");
    assert_eq!(resolve_db_path(Some(path.clone())).unwrap(), path);
}

#[test]
fn select_conflicts_by_all_exact_and_prefix() {
    let conflicts = vec![
        conflict_for("local-aaa-1"),
        conflict_for("local-aaa-2"),
        conflict_for("local-bbb"),
    ];

    assert_eq!(select_conflicts(&conflicts, "all").unwrap().len(), 3);
    assert_eq!(
        select_conflicts(&conflicts, "local-aaa-2").unwrap()[0].local_id,
        "local-aaa-2".parse::<QuoteId>().unwrap()
    );
    assert_eq!(
        select_conflicts(&conflicts, "local-b").unwrap()[0].local_id,
        "local-bbb".parse::<QuoteId>().unwrap()
    );
}

#[test]
fn select_conflicts_rejects_unknown_ambiguous_and_empty_targets() {
    let conflicts = vec![conflict_for("local-aaa-1"), conflict_for("local-aaa-2")];

    assert!(matches!(
        select_conflicts(&conflicts, "local-zzz"),
        Err(CliError::ConflictNotFound(_))
    ));
    assert!(matches!(
        select_conflicts(&conflicts, "local-aaa"),
        Err(CliError::AmbiguousQuoteId(_))
    ));
    assert!(matches!(
        select_conflicts(&conflicts, "  "),
        Err(CliError::EmptyQuoteId)
    ));
}

#[test]
fn run_add_appends_pending_quote_to_seeded_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("quotes.db");

    run_add(&["Stay".to_string(), "curious".to_string()], " Learning ", &db_path).unwrap();

    let quotes = SqliteQuoteStore::open(&db_path).unwrap().load().unwrap();
    assert_eq!(quotes.len(), 4);
    let added = &quotes[3];
    assert_eq!(added.text, "Stay curious");
    assert_eq!(added.category, "Learning");
    assert!(added.is_pending_push());
}

#[test]
fn run_add_rejects_blank_category() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("quotes.db");

    let error = run_add(&["Stay curious".to_string()], "  ", &db_path).unwrap_err();
    assert!(matches!(error, CliError::Core(_)));
}

#[test]
fn pick_random_quote_remembers_category_and_last_quote() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteQuoteStore::open(dir.path().join("quotes.db")).unwrap();

    let picked = pick_random_quote(&store, Some("Wisdom")).unwrap().unwrap();
    assert_eq!(picked.text, SEEDED_WISDOM);

    // No category given: the remembered one applies
    let again = pick_random_quote(&store, None).unwrap().unwrap();
    assert_eq!(again.category, "Wisdom");
    assert_eq!(
        store.with_meta(|meta| meta.last_quote_id()).unwrap(),
        Some(again.id)
    );

    assert!(pick_random_quote(&store, Some("Missing")).unwrap().is_none());
}

#[test]
fn remembered_quote_returns_last_pick_while_it_exists() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteQuoteStore::open(dir.path().join("quotes.db")).unwrap();
    assert!(remembered_quote(&store).unwrap().is_none());

    let picked = pick_random_quote(&store, Some("Success")).unwrap().unwrap();
    assert_eq!(remembered_quote(&store).unwrap(), Some(picked));

    let gone = QuoteId::new_local();
    store.with_meta(|meta| meta.set_last_quote_id(&gone)).unwrap();
    assert!(remembered_quote(&store).unwrap().is_none());
}

#[test]
fn run_export_then_import_into_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let source_db = dir.path().join("source.db");
    let target_db = dir.path().join("target.db");
    let export_path = dir.path().join("quotes.json");

    run_add(&["Stay curious".to_string()], "Learning", &source_db).unwrap();
    run_export(Some(&export_path), &source_db).unwrap();

    // Seeded quotes in the target have their own ids, so only ids are deduplicated
    let summary = import_file(&export_path, &target_db).unwrap();
    assert_eq!(summary.imported, 4);
    assert_eq!(summary.skipped, 0);
    assert_eq!(
        SqliteQuoteStore::open(&target_db).unwrap().load().unwrap().len(),
        7
    );

    let repeat = import_file(&export_path, &target_db).unwrap();
    assert_eq!(repeat.imported, 0);
    assert_eq!(repeat.skipped, 4);
}

#[test]
fn config_set_persists_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");

    run_config_set(
        SettingsUpdate {
            fetch_limit: Some(25),
            interval_secs: Some(60),
            ..SettingsUpdate::default()
        },
        &config_path,
    )
    .unwrap();
    let settings = load_settings(&config_path).unwrap();
    assert_eq!(settings.fetch_limit, 25);
    assert_eq!(settings.interval_secs, 60);

    let invalid = run_config_set(
        SettingsUpdate {
            remote_url: Some("ftp://example.com".to_string()),
            ..SettingsUpdate::default()
        },
        &config_path,
    );
    assert!(invalid.is_err());
    assert_eq!(load_settings(&config_path).unwrap().fetch_limit, 25);
}

#[tokio::test]
async fn sync_records_conflicts_and_resolve_clears_them() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("quotes.db");
    let gateway = StaticGateway::new(vec![RemoteItem::new(1, SEEDED_WISDOM, "ServerCat-1")]);
    let scheduler = test_scheduler(gateway, &db_path);

    let outcome = scheduler.run_cycle().await;
    let summary = report_cycle(&scheduler, outcome).unwrap();
    assert_eq!(
        summary,
        "Sync complete. Pushed 3 local item(s). 1 conflict(s) detected."
    );

    let store = scheduler.engine().store();
    let open = store.open_conflicts().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].local_category_before, "Wisdom");
    assert_eq!(open[0].remote_category, "ServerCat-1");

    let lines = resolve_open_conflicts(&scheduler, "all", Resolution::KeepLocal)
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Wisdom"));
    assert!(store.open_conflicts().unwrap().is_empty());

    let saved = store.load().unwrap();
    let wisdom = saved.iter().find(|quote| quote.text == SEEDED_WISDOM).unwrap();
    assert_eq!(wisdom.category, "Wisdom");
    assert!(wisdom.is_pending_push());
}

#[tokio::test]
async fn clean_sync_clears_previous_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("quotes.db");
    let scheduler = test_scheduler(StaticGateway::new(Vec::new()), &db_path);
    scheduler
        .engine()
        .store()
        .replace_conflicts(&[conflict_for("local-stale")])
        .unwrap();

    let outcome = scheduler.run_cycle().await;
    let summary = report_cycle(&scheduler, outcome).unwrap();

    assert_eq!(summary, "Sync complete. Pushed 3 local item(s). No conflicts.");
    assert!(scheduler.engine().store().open_conflicts().unwrap().is_empty());
}

#[tokio::test]
async fn resolve_without_open_conflicts_reports_nothing_to_do() {
    let dir = tempfile::tempdir().unwrap();
    let scheduler = test_scheduler(StaticGateway::new(Vec::new()), &dir.path().join("q.db"));

    let lines = resolve_open_conflicts(&scheduler, "all", Resolution::KeepRemote)
        .await
        .unwrap();
    assert_eq!(lines, vec!["No open conflicts.".to_string()]);
}

#[test]
fn skipped_cycle_is_reported_without_touching_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let scheduler = test_scheduler(StaticGateway::new(Vec::new()), &dir.path().join("q.db"));
    scheduler
        .engine()
        .store()
        .replace_conflicts(&[conflict_for("local-open")])
        .unwrap();

    let line = report_cycle(&scheduler, Ok(CycleOutcome::Skipped)).unwrap();
    assert_eq!(line, "Sync already in progress; skipped.");
    assert_eq!(scheduler.engine().store().open_conflicts().unwrap().len(), 1);
}
