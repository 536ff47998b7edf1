// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-memory draft list authority.
//!
//! The manager owns the canonical `Vec<Draft>` for one entity kind. All
//! mutations read-modify-write this list directly; storage is only re-read
//! once at startup. Sequential calls within one process therefore observe a
//! consistent, monotonically updated view. Concurrent writers in other
//! processes are not coordinated: the persisted list is last-writer-wins.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::model::{merge_patch, Draft, DraftId, DraftPatch, NaturalKey};
use crate::store::{DraftStore, StoreError};

/// Upper bound on the number of drafts kept per entity kind.
pub const DEFAULT_CAPACITY: usize = 20;

/// Millisecond clock used to stamp `updated_at`. Swappable for tests.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

pub struct DraftManager {
    store: DraftStore,
    drafts: Vec<Draft>,
    capacity: usize,
    clock: Arc<dyn Clock>,
    /// The in-memory list is ahead of storage after a failed persist.
    dirty: bool,
}

impl fmt::Debug for DraftManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftManager")
            .field("drafts", &self.drafts.len())
            .field("capacity", &self.capacity)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl DraftManager {
    pub fn new(store: DraftStore) -> Self {
        Self {
            store,
            drafts: Vec::new(),
            capacity: DEFAULT_CAPACITY,
            clock: Arc::new(SystemClock),
            dirty: false,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Loads the persisted list once at startup. The loaded list is
    /// re-normalized first: a payload written by a larger-capacity writer or
    /// edited externally may carry duplicate natural keys or more entries
    /// than this manager allows. A pending fallback-slot entry is then
    /// reconciled through `upsert`, so it participates in the same dedup and
    /// merge rules, and the slot is cleared.
    pub async fn load(&mut self) {
        self.drafts = self.store.load_all().await;
        self.normalize_loaded_list();
        if let Some(patch) = self.store.take_fallback() {
            self.upsert(patch).await;
        }
    }

    /// Accepts a candidate snapshot and returns the resolved draft id so
    /// callers can pin subsequent ticks to the same entry.
    ///
    /// Resolution order: match by `patch.draft_id`, else by non-empty
    /// natural key, else append with a freshly generated id. On match the
    /// patch is merged field-by-field over the existing entry (patch wins,
    /// existing id preserved) and `updated_at` is stamped without ever
    /// moving backwards.
    ///
    /// Known heuristic: when the title (and with it the derived natural key)
    /// changes mid-session before any tick has pinned an id, neither match
    /// fires and the upsert creates a second draft. Callers narrow that
    /// window by pinning the returned id from the first accepted tick.
    ///
    /// Persistence is fire-and-forget from the caller's perspective: a
    /// failed write is logged, leaves the manager dirty, and is retried on
    /// the next mutation or [`flush`](Self::flush).
    pub async fn upsert(&mut self, patch: DraftPatch) -> DraftId {
        let draft_id = self.apply_patch(patch);
        if let Err(err) = self.persist().await {
            warn!(error = %err, draft_id = %draft_id, "draft persist failed; kept in memory until the next write");
        }
        draft_id
    }

    /// Same mutation as `upsert`, but the persist failure is surfaced so an
    /// explicit "save as draft" action can show its one notification.
    pub async fn save_draft(&mut self, patch: DraftPatch) -> Result<DraftId, StoreError> {
        let draft_id = self.apply_patch(patch);
        self.persist().await?;
        Ok(draft_id)
    }

    /// Removes the draft with the given id. A missing id is a no-op.
    pub async fn delete(&mut self, draft_id: &DraftId) {
        let before = self.drafts.len();
        self.drafts.retain(|draft| draft.draft_id() != draft_id);
        if self.drafts.len() == before {
            return;
        }
        if let Err(err) = self.persist().await {
            warn!(error = %err, "draft persist failed after delete");
        }
    }

    /// Removes drafts bearing the given natural key. The backend commit flow
    /// calls this after a successful create/update so the now-obsolete local
    /// draft disappears. A missing key is a no-op.
    pub async fn delete_by_natural_key(&mut self, natural_key: &NaturalKey) {
        let before = self.drafts.len();
        self.drafts
            .retain(|draft| draft.natural_key() != Some(natural_key));
        if self.drafts.len() == before {
            return;
        }
        if let Err(err) = self.persist().await {
            warn!(error = %err, "draft persist failed after delete_by_natural_key");
        }
    }

    /// Entries sorted by `updated_at` descending, for display and resume.
    pub fn list(&self) -> Vec<&Draft> {
        let mut drafts: Vec<&Draft> = self.drafts.iter().collect();
        drafts.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        drafts
    }

    pub fn get(&self, draft_id: &DraftId) -> Option<&Draft> {
        self.drafts.iter().find(|draft| draft.draft_id() == draft_id)
    }

    /// Re-attempts a persist left behind by an earlier failed write. A
    /// no-op while the in-memory list already matches storage, so ticks that
    /// skip their content write can still call this cheaply.
    pub async fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        if let Err(err) = self.persist().await {
            warn!(error = %err, "draft persist retry failed; still dirty");
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    async fn persist(&mut self) -> Result<(), StoreError> {
        match self.store.save_all(&self.drafts).await {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                Err(err)
            }
        }
    }

    fn apply_patch(&mut self, patch: DraftPatch) -> DraftId {
        let now = self.clock.now_ms();

        let draft_id = match self.match_position(&patch) {
            Some(idx) => {
                merge_patch(&mut self.drafts[idx], &patch);
                self.drafts[idx].touch(now);
                let draft_id = self.drafts[idx].draft_id().clone();
                self.collapse_natural_key_duplicates(&draft_id);
                draft_id
            }
            None => {
                let draft_id = DraftId::generate();
                let mut draft = Draft::new(draft_id.clone());
                merge_patch(&mut draft, &patch);
                draft.touch(now);
                self.drafts.push(draft);
                draft_id
            }
        };

        self.evict_over_capacity();
        draft_id
    }

    fn match_position(&self, patch: &DraftPatch) -> Option<usize> {
        if let Some(draft_id) = patch.draft_id.as_ref() {
            if let Some(idx) = self
                .drafts
                .iter()
                .position(|draft| draft.draft_id() == draft_id)
            {
                return Some(idx);
            }
        }

        let natural_key = patch.natural_key.as_ref()?;
        self.drafts
            .iter()
            .position(|draft| draft.natural_key() == Some(natural_key))
    }

    /// Re-establishes the list invariants on a freshly loaded payload:
    /// at most one entry per non-empty natural key (the newest entry wins a
    /// contested key; older ones are folded under it, winner wins per field)
    /// and no more entries than this manager's capacity.
    fn normalize_loaded_list(&mut self) {
        self.drafts
            .sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));

        let mut kept: Vec<Draft> = Vec::with_capacity(self.drafts.len());
        for draft in self.drafts.drain(..) {
            let winner = draft
                .natural_key()
                .and_then(|key| kept.iter_mut().find(|entry| entry.natural_key() == Some(key)));
            match winner {
                Some(winner) => {
                    for (name, value) in draft.fields() {
                        winner
                            .fields_mut()
                            .entry(name.clone())
                            .or_insert_with(|| value.clone());
                    }
                    for (slot, meta) in draft.attachments() {
                        winner
                            .attachments_mut()
                            .entry(slot.clone())
                            .or_insert_with(|| meta.clone());
                    }
                }
                None => kept.push(draft),
            }
        }
        kept.truncate(self.capacity);
        self.drafts = kept;
    }

    /// An id-matched merge can move an entry onto a natural key another
    /// entry already holds. The winner keeps its id; losers are folded under
    /// it (winner wins per field) and removed, keeping the at-most-one-entry
    /// -per-key invariant.
    fn collapse_natural_key_duplicates(&mut self, winner_id: &DraftId) {
        let Some(natural_key) = self
            .get(winner_id)
            .and_then(|draft| draft.natural_key().cloned())
        else {
            return;
        };

        let mut absorbed = Vec::new();
        self.drafts.retain(|draft| {
            if draft.draft_id() == winner_id || draft.natural_key() != Some(&natural_key) {
                true
            } else {
                absorbed.push(draft.clone());
                false
            }
        });

        if absorbed.is_empty() {
            return;
        }

        let winner = self
            .drafts
            .iter_mut()
            .find(|draft| draft.draft_id() == winner_id)
            .expect("winner survives the retain above");
        for other in absorbed {
            for (name, value) in other.fields() {
                winner
                    .fields_mut()
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
            for (slot, meta) in other.attachments() {
                winner
                    .attachments_mut()
                    .entry(slot.clone())
                    .or_insert_with(|| meta.clone());
            }
            winner.touch(other.updated_at());
        }
    }

    fn evict_over_capacity(&mut self) {
        if self.drafts.len() <= self.capacity {
            return;
        }
        self.drafts
            .sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        self.drafts.truncate(self.capacity);
    }
}
