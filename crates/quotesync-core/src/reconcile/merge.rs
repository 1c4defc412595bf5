//! Merge remote quotes into a local set and apply manual overrides.
//!
//! Quotes are matched by case-insensitive text; the first local match wins
//! when several local quotes share a text. On a category mismatch the remote
//! value is applied immediately and the previous local values are kept as a
//! backup until the conflict is resolved.

use crate::models::{Conflict, Origin, QuoteRecord, QuoteSet, Resolution, SyncState};

/// What a merge pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Remote quotes appended because no local quote matched
    pub added: usize,
    /// Matched quotes whose categories already agreed
    pub reconciled: usize,
    pub conflicts: Vec<Conflict>,
}

/// Local quotes waiting for their first push, in set order.
pub fn collect_pending_pushes(quotes: &QuoteSet) -> Vec<&QuoteRecord> {
    quotes
        .iter()
        .filter(|quote| quote.is_pending_push())
        .collect()
}

/// Merge `remote` into `quotes` in place.
pub fn merge_remote(quotes: &mut QuoteSet, remote: Vec<QuoteRecord>, now: i64) -> MergeOutcome {
    let cleared = quotes.clear_backups();
    if cleared > 0 {
        tracing::debug!("Cleared {cleared} unresolved conflict backups from an earlier merge");
    }

    let mut outcome = MergeOutcome::default();
    for incoming in remote {
        let Some(remote_ref) = incoming.remote_ref.clone() else {
            tracing::debug!("Skipping remote quote {} without a remote id", incoming.id);
            continue;
        };

        let Some(index) = quotes.position_by_text(&incoming.text) else {
            if let Some(existing) = quotes.get_mut(&incoming.id) {
                // Same remote item, text edited on the remote side
                tracing::debug!("Remote quote {} changed text", incoming.id);
                existing.text = incoming.text;
                existing.adopt_remote(&incoming.category, Some(&remote_ref));
                existing.updated_at = now;
                outcome.reconciled += 1;
            } else {
                quotes.push(incoming);
                outcome.added += 1;
            }
            continue;
        };

        let local = &mut quotes[index];
        if local.category == incoming.category {
            local.origin = Origin::Remote;
            if local.remote_ref.is_none() {
                local.remote_ref = Some(remote_ref);
            }
            local.sync_state = SyncState::Synced;
            outcome.reconciled += 1;
            continue;
        }

        let local_category_before = local.category.clone();
        local.backup = Some(local.snapshot());
        local.adopt_remote(&incoming.category, Some(&remote_ref));
        local.updated_at = now;

        tracing::info!(
            "Conflict on {}: local category '{}' replaced by remote '{}'",
            local.id,
            local_category_before,
            incoming.category
        );
        outcome.conflicts.push(Conflict {
            text: incoming.text.clone(),
            local_category_before,
            remote_category: incoming.category.clone(),
            local_id: local.id.clone(),
            remote_record: incoming,
        });
    }

    outcome
}

/// Apply one manual override. Returns the updated quote, or `None` when the
/// quote the conflict refers to is gone.
pub fn apply_resolution(
    quotes: &mut QuoteSet,
    conflict: &Conflict,
    resolution: Resolution,
    now: i64,
) -> Option<QuoteRecord> {
    let Some(local) = quotes.get_mut(&conflict.local_id) else {
        tracing::warn!(
            "Conflict target {} no longer exists; ignoring {resolution} resolution",
            conflict.local_id
        );
        return None;
    };

    match resolution {
        Resolution::KeepLocal => {
            if let Some(backup) = local.backup.take() {
                local.restore(backup);
            }
            local.origin = Origin::Local;
            local.sync_state = SyncState::Pending;
            local.updated_at = now;
        }
        Resolution::KeepRemote => {
            let remote = &conflict.remote_record;
            local.adopt_remote(&remote.category, remote.remote_ref.as_ref());
            local.backup = None;
            local.updated_at = now;
        }
    }

    Some(local.clone())
}
