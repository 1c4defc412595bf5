//! Reconciliation engine.
//!
//! A sync cycle pushes pending local quotes, fetches the remote set and merges
//! it into the caller's [`QuoteSet`], saving through the [`QuoteStore`] after
//! each step that changed something. When a step fails, the set is put back
//! to what the store last saved, so memory never runs ahead of durable state.

mod merge;

pub use merge::{apply_resolution, collect_pending_pushes, merge_remote, MergeOutcome};

use std::collections::HashSet;

use crate::db::QuoteStore;
use crate::error::Result;
use crate::gateway::{RemoteGateway, RemoteItem};
use crate::models::{Conflict, QuoteId, QuoteRecord, QuoteSet, Resolution};
use crate::util::{normalize_text_option, now_millis};

/// Result of one push/fetch/merge cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local quotes the remote side acknowledged
    pub pushed: usize,
    /// Usable remote quotes fetched
    pub fetched: usize,
    /// Remote quotes that were new locally
    pub added: usize,
    /// Conflicts resolved remote-first, open for override
    pub conflicts: Vec<Conflict>,
}

impl SyncReport {
    /// One-line summary for the user
    pub fn summary(&self) -> String {
        let conflicts = if self.conflicts.is_empty() {
            "No conflicts.".to_string()
        } else {
            format!("{} conflict(s) detected.", self.conflicts.len())
        };
        format!(
            "Sync complete. Pushed {} local item(s). {conflicts}",
            self.pushed
        )
    }
}

/// Generic notice shown when a cycle fails
pub const SYNC_FAILED_NOTICE: &str = "Sync failed. Check network.";

/// Runs sync steps against a gateway, persisting through a store.
///
/// The engine never keeps a copy of the quotes; every operation borrows the
/// caller's set.
pub struct SyncEngine<G, S> {
    gateway: G,
    store: S,
}

impl<G: RemoteGateway, S: QuoteStore> SyncEngine<G, S> {
    pub const fn new(gateway: G, store: S) -> Self {
        Self { gateway, store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Push every pending local quote, one at a time.
    ///
    /// A failed push leaves that quote pending and moves on. Saves when at
    /// least one push succeeded.
    pub async fn push_pending(&self, quotes: &mut QuoteSet) -> Result<usize> {
        let pending = collect_pending_pushes(quotes)
            .into_iter()
            .map(|quote| (quote.id.clone(), quote.text.clone(), quote.category.clone()))
            .collect::<Vec<_>>();
        if pending.is_empty() {
            return Ok(0);
        }

        let snapshot = quotes.clone();
        let mut pushed = 0;
        for (id, text, category) in pending {
            match self.gateway.push_one(&text, &category).await {
                Ok(remote_id) => {
                    if let Some(quote) = quotes.get_mut(&id) {
                        tracing::debug!("Pushed {id} as remote {remote_id}");
                        quote.mark_pushed(remote_id, now_millis());
                        pushed += 1;
                    }
                }
                Err(error) => {
                    tracing::warn!("Push of {id} failed, leaving it pending: {error}");
                }
            }
        }

        if pushed > 0 {
            if let Err(error) = self.store.save(quotes) {
                *quotes = snapshot;
                return Err(error);
            }
        }
        Ok(pushed)
    }

    /// Fetch and normalize the remote set. Items without usable text are
    /// dropped.
    pub async fn fetch_remote(&self) -> Result<Vec<QuoteRecord>> {
        let items = self.gateway.fetch_all().await?;
        Ok(normalize_remote_items(items, now_millis()))
    }

    /// Merge `remote` into `quotes` and save the result.
    pub fn merge(&self, quotes: &mut QuoteSet, remote: Vec<QuoteRecord>) -> Result<MergeOutcome> {
        let snapshot = quotes.clone();
        let outcome = merge_remote(quotes, remote, now_millis());
        if let Err(error) = self.store.save(quotes) {
            *quotes = snapshot;
            return Err(error);
        }
        Ok(outcome)
    }

    /// Push, fetch, merge. Conflicts come back already resolved remote-first.
    pub async fn sync_cycle(&self, quotes: &mut QuoteSet) -> Result<SyncReport> {
        tracing::info!("Sync in progress...");
        let pushed = self.push_pending(quotes).await?;
        let remote = self.fetch_remote().await?;
        let fetched = remote.len();
        let outcome = self.merge(quotes, remote)?;

        let report = SyncReport {
            pushed,
            fetched,
            added: outcome.added,
            conflicts: outcome.conflicts,
        };
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    /// Apply one manual override and save.
    pub fn resolve_conflict(
        &self,
        quotes: &mut QuoteSet,
        conflict: &Conflict,
        resolution: Resolution,
    ) -> Result<Option<QuoteRecord>> {
        let mut updated = self.resolve_conflicts(quotes, &[(conflict.clone(), resolution)])?;
        Ok(updated.pop())
    }

    /// Apply a batch of overrides, then save once.
    ///
    /// Conflicts whose quote no longer exists are skipped; the returned list
    /// only holds quotes that were updated.
    pub fn resolve_conflicts(
        &self,
        quotes: &mut QuoteSet,
        resolutions: &[(Conflict, Resolution)],
    ) -> Result<Vec<QuoteRecord>> {
        let snapshot = quotes.clone();
        let now = now_millis();
        let updated = resolutions
            .iter()
            .filter_map(|(conflict, resolution)| {
                apply_resolution(quotes, conflict, *resolution, now)
            })
            .collect::<Vec<_>>();

        if let Err(error) = self.store.save(quotes) {
            *quotes = snapshot;
            return Err(error);
        }
        tracing::info!("Conflicts resolved: {} applied", updated.len());
        Ok(updated)
    }
}

fn normalize_remote_items(items: Vec<RemoteItem>, now: i64) -> Vec<QuoteRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Some(text) = normalize_text_option(Some(item.text)) else {
            tracing::debug!("Discarding remote item {} without text", item.remote_id);
            continue;
        };
        let Some(category) = normalize_text_option(Some(item.category)) else {
            tracing::debug!("Discarding remote item {} without category", item.remote_id);
            continue;
        };
        if !seen.insert(QuoteId::from_remote(&item.remote_id)) {
            tracing::debug!("Discarding repeated remote item {}", item.remote_id);
            continue;
        }
        records.push(QuoteRecord::from_remote(item.remote_id, text, category, now));
    }
    records
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::db::QuoteStore;
    use crate::error::{Error, Result};
    use crate::gateway::{GatewayError, GatewayResult, RemoteGateway, RemoteItem};
    use crate::models::{QuoteSet, RemoteId};

    /// Gateway with a fixed remote list and per-text push failures.
    #[derive(Default)]
    pub struct ScriptedGateway {
        pub items: Mutex<Vec<RemoteItem>>,
        pub failing_texts: Mutex<HashSet<String>>,
        pub fetch_fails: AtomicBool,
        pub fetch_delay: Mutex<Option<Duration>>,
        pub pushed: Mutex<Vec<(String, String)>>,
        pub fetches: AtomicUsize,
        next_id: AtomicUsize,
    }

    impl ScriptedGateway {
        pub fn with_items(items: Vec<RemoteItem>) -> Self {
            Self {
                items: Mutex::new(items),
                next_id: AtomicUsize::new(100),
                ..Self::default()
            }
        }

        pub fn fail_push_of(&self, text: &str) {
            self.failing_texts.lock().unwrap().insert(text.to_string());
        }

        pub fn pushed_texts(&self) -> Vec<String> {
            self.pushed
                .lock()
                .unwrap()
                .iter()
                .map(|(text, _)| text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl RemoteGateway for ScriptedGateway {
        async fn fetch_all(&self) -> GatewayResult<Vec<RemoteItem>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let delay = *self.fetch_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fetch_fails.load(Ordering::SeqCst) {
                return Err(GatewayError::Api("offline (503)".to_string()));
            }
            Ok(self.items.lock().unwrap().clone())
        }

        async fn push_one(&self, text: &str, category: &str) -> GatewayResult<RemoteId> {
            if self.failing_texts.lock().unwrap().contains(text) {
                return Err(GatewayError::Api("rejected (500)".to_string()));
            }
            self.pushed
                .lock()
                .unwrap()
                .push((text.to_string(), category.to_string()));
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteId::new(id.to_string()))
        }
    }

    /// Store whose saves can be switched to fail.
    #[derive(Default)]
    pub struct FlakyStore {
        pub saved: Mutex<QuoteSet>,
        pub fail_saves: AtomicBool,
    }

    impl QuoteStore for FlakyStore {
        fn load(&self) -> Result<QuoteSet> {
            Ok(self.saved.lock().unwrap().clone())
        }

        fn save(&self, quotes: &QuoteSet) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(Error::Storage("disk full".to_string()));
            }
            self.saved.lock().unwrap().clone_from(quotes);
            Ok(())
        }
    }
}
