//! Periodic sync driver.
//!
//! The scheduler owns the quote set behind an async mutex that doubles as the
//! re-entrancy guard: a sync request arriving while a cycle holds it is
//! skipped, while conflict resolution waits for it. A cycle that exceeds the
//! timeout is dropped and the set is reloaded from the store.
//!
//! Other processes may write the same store between cycles, so both cycles
//! and resolutions start from a fresh load taken under the guard.

use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::db::QuoteStore;
use crate::error::{Error, Result};
use crate::gateway::RemoteGateway;
use crate::models::{Conflict, QuoteRecord, QuoteSet, Resolution};
use crate::reconcile::{SyncEngine, SyncReport};
use crate::state::SyncStatus;

/// What happened to a requested cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(SyncReport),
    /// Another cycle or a resolution held the guard
    Skipped,
}

pub struct SyncScheduler<G, S> {
    engine: SyncEngine<G, S>,
    quotes: Arc<Mutex<QuoteSet>>,
    timeout: Duration,
    status: StdMutex<SyncStatus>,
}

impl<G: RemoteGateway, S: QuoteStore> SyncScheduler<G, S> {
    pub fn new(engine: SyncEngine<G, S>, quotes: QuoteSet, timeout: Duration) -> Self {
        Self {
            engine,
            quotes: Arc::new(Mutex::new(quotes)),
            timeout,
            status: StdMutex::new(SyncStatus::Idle),
        }
    }

    pub const fn engine(&self) -> &SyncEngine<G, S> {
        &self.engine
    }

    /// Shared handle to the quote set; lock it to read or edit between cycles
    pub fn quotes(&self) -> Arc<Mutex<QuoteSet>> {
        Arc::clone(&self.quotes)
    }

    pub fn status(&self) -> SyncStatus {
        self.status
            .lock()
            .map_or(SyncStatus::Error, |status| *status)
    }

    /// Run one cycle unless one is already in flight.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let Ok(mut quotes) = self.quotes.try_lock() else {
            tracing::info!("Sync already in progress; skipping this request");
            return Ok(CycleOutcome::Skipped);
        };

        self.set_status(SyncStatus::Syncing);
        match self.engine.store().load() {
            Ok(latest) => *quotes = latest,
            Err(error) => {
                tracing::warn!("Failed to reload quotes before sync: {error}");
                self.set_status(SyncStatus::Error);
                return Err(error);
            }
        }
        let result = tokio::time::timeout(self.timeout, self.engine.sync_cycle(&mut quotes)).await;

        match result {
            Ok(Ok(report)) => {
                self.set_status(SyncStatus::Synced);
                Ok(CycleOutcome::Completed(report))
            }
            Ok(Err(error)) => {
                tracing::warn!("Sync cycle failed: {error}");
                self.set_status(SyncStatus::Error);
                Err(error)
            }
            Err(_) => {
                tracing::warn!("Sync cycle timed out after {:?}", self.timeout);
                self.set_status(SyncStatus::Error);
                *quotes = self.engine.store().load()?;
                Err(Error::Timeout(self.timeout))
            }
        }
    }

    /// Apply manual overrides once no cycle holds the set.
    pub async fn resolve(
        &self,
        resolutions: &[(Conflict, Resolution)],
    ) -> Result<Vec<QuoteRecord>> {
        let mut quotes = self.quotes.lock().await;
        *quotes = self.engine.store().load()?;
        self.engine.resolve_conflicts(&mut quotes, resolutions)
    }

    /// Run cycles every `interval` until `shutdown` completes, handing each
    /// result to `on_cycle`. The first cycle starts immediately.
    pub async fn run_every<F, Fut>(&self, interval: Duration, shutdown: Fut, mut on_cycle: F)
    where
        F: FnMut(Result<CycleOutcome>),
        Fut: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Auto sync stopped");
                    break;
                }
                _ = ticker.tick() => {
                    on_cycle(self.run_cycle().await);
                }
            }
        }
    }

    fn set_status(&self, status: SyncStatus) {
        if let Ok(mut current) = self.status.lock() {
            *current = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::db::{MemoryQuoteStore, SqliteQuoteStore};
    use crate::gateway::RemoteItem;
    use crate::models::SyncState;
    use crate::reconcile::test_support::ScriptedGateway;

    fn scheduler(
        gateway: Arc<ScriptedGateway>,
        quotes: QuoteSet,
    ) -> SyncScheduler<Arc<ScriptedGateway>, Arc<MemoryQuoteStore>> {
        let store = Arc::new(MemoryQuoteStore::with_quotes(quotes.clone()));
        SyncScheduler::new(
            SyncEngine::new(gateway, store),
            quotes,
            Duration::from_secs(5),
        )
    }

    fn pending(text: &str, category: &str) -> QuoteSet {
        let mut quotes = QuoteSet::new();
        quotes.add_quote(text, category, 1).unwrap();
        quotes
    }

    #[tokio::test]
    async fn run_cycle_completes_and_updates_status() {
        let gateway = Arc::new(ScriptedGateway::with_items(vec![RemoteItem::new(1, "New", "X")]));
        let scheduler = scheduler(gateway, QuoteSet::new());
        assert_eq!(scheduler.status(), SyncStatus::Idle);

        let outcome = scheduler.run_cycle().await.unwrap();
        let CycleOutcome::Completed(report) = outcome else {
            panic!("cycle should run");
        };
        assert_eq!(report.added, 1);
        assert_eq!(scheduler.status(), SyncStatus::Synced);
        assert_eq!(scheduler.quotes().lock().await.len(), 1);
    }

    #[tokio::test]
    async fn run_cycle_is_skipped_while_guard_is_held() {
        let gateway = Arc::new(ScriptedGateway::with_items(Vec::new()));
        let scheduler = scheduler(Arc::clone(&gateway), QuoteSet::new());

        let handle = scheduler.quotes();
        let guard = handle.lock().await;
        assert_eq!(scheduler.run_cycle().await.unwrap(), CycleOutcome::Skipped);
        drop(guard);

        assert_eq!(gateway.fetches.load(Ordering::SeqCst), 0);
        assert!(matches!(
            scheduler.run_cycle().await.unwrap(),
            CycleOutcome::Completed(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_request_is_skipped_not_interleaved() {
        let gateway = Arc::new(ScriptedGateway::with_items(Vec::new()));
        *gateway.fetch_delay.lock().unwrap() = Some(Duration::from_secs(1));
        let scheduler = scheduler(Arc::clone(&gateway), QuoteSet::new());

        let (first, second) = tokio::join!(scheduler.run_cycle(), scheduler.run_cycle());

        assert!(matches!(first.unwrap(), CycleOutcome::Completed(_)));
        assert_eq!(second.unwrap(), CycleOutcome::Skipped);
        assert_eq!(gateway.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_cycle_reloads_durable_state() {
        let gateway = Arc::new(ScriptedGateway::with_items(Vec::new()));
        *gateway.fetch_delay.lock().unwrap() = Some(Duration::from_secs(60));
        let scheduler = scheduler(Arc::clone(&gateway), pending("P1", "A"));

        let error = scheduler.run_cycle().await.unwrap_err();
        assert!(matches!(error, Error::Timeout(_)));
        assert_eq!(scheduler.status(), SyncStatus::Error);

        // The push completed and was saved before the fetch stalled
        let quotes = scheduler.quotes();
        let quotes = quotes.lock().await;
        assert_eq!(quotes[0].sync_state, SyncState::Synced);
        assert_eq!(*quotes, scheduler.engine().store().load().unwrap());
    }

    #[tokio::test]
    async fn failed_cycle_reports_error_status() {
        let gateway = Arc::new(ScriptedGateway::with_items(Vec::new()));
        gateway.fetch_fails.store(true, Ordering::SeqCst);
        let scheduler = scheduler(gateway, QuoteSet::new());

        assert!(scheduler.run_cycle().await.is_err());
        assert_eq!(scheduler.status(), SyncStatus::Error);
    }

    #[tokio::test]
    async fn resolve_goes_through_the_guard() {
        let gateway = Arc::new(ScriptedGateway::with_items(vec![RemoteItem::new(
            1, "Be bold", "B",
        )]));
        let scheduler = scheduler(gateway, pending("Be bold", "A"));

        let CycleOutcome::Completed(report) = scheduler.run_cycle().await.unwrap() else {
            panic!("cycle should run");
        };
        let updated = scheduler
            .resolve(&[(report.conflicts[0].clone(), Resolution::KeepLocal)])
            .await
            .unwrap();

        assert_eq!(updated[0].category, "A");
        assert_eq!(scheduler.quotes().lock().await[0].category, "A");
    }

    #[tokio::test]
    async fn cycle_keeps_quotes_written_by_another_store_handle() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("quotes.db");
        let store = SqliteQuoteStore::open(&db_path).unwrap();
        let quotes = store.load_or_seed().unwrap();
        let gateway = Arc::new(ScriptedGateway::with_items(Vec::new()));
        let scheduler = SyncScheduler::new(
            SyncEngine::new(Arc::clone(&gateway), store),
            quotes,
            Duration::from_secs(5),
        );

        let other = SqliteQuoteStore::open(&db_path).unwrap();
        let mut latest = other.load().unwrap();
        latest.add_quote("Added elsewhere", "Elsewhere", 2).unwrap();
        other.save(&latest).unwrap();

        let CycleOutcome::Completed(report) = scheduler.run_cycle().await.unwrap() else {
            panic!("cycle should run");
        };
        assert_eq!(report.pushed, 4);

        let stored = other.load().unwrap();
        assert_eq!(stored.len(), 4);
        let added = stored
            .iter()
            .find(|quote| quote.text == "Added elsewhere")
            .unwrap();
        assert_eq!(added.sync_state, SyncState::Synced);
        assert_eq!(scheduler.quotes().lock().await.len(), 4);
    }

    #[tokio::test]
    async fn resolve_starts_from_stored_quotes() {
        let gateway = Arc::new(ScriptedGateway::with_items(vec![RemoteItem::new(
            1, "Be bold", "B",
        )]));
        let scheduler = scheduler(gateway, pending("Be bold", "A"));
        let CycleOutcome::Completed(report) = scheduler.run_cycle().await.unwrap() else {
            panic!("cycle should run");
        };

        let store = scheduler.engine().store();
        let mut latest = store.load().unwrap();
        latest.add_quote("Added elsewhere", "Elsewhere", 2).unwrap();
        store.save(&latest).unwrap();

        scheduler
            .resolve(&[(report.conflicts[0].clone(), Resolution::KeepRemote)])
            .await
            .unwrap();

        let stored = store.load().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].category, "B");
    }

    #[tokio::test(start_paused = true)]
    async fn run_every_stops_on_shutdown() {
        let gateway = Arc::new(ScriptedGateway::with_items(Vec::new()));
        let scheduler = scheduler(Arc::clone(&gateway), QuoteSet::new());

        let mut completed = 0;
        scheduler
            .run_every(
                Duration::from_secs(30),
                tokio::time::sleep(Duration::from_secs(75)),
                |outcome| {
                    if matches!(outcome, Ok(CycleOutcome::Completed(_))) {
                        completed += 1;
                    }
                },
            )
            .await;

        // Ticks at 0s, 30s and 60s
        assert_eq!(completed, 3);
        assert_eq!(gateway.fetches.load(Ordering::SeqCst), 3);
    }
}
