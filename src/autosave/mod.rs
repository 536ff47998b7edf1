// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-session autosave scheduling.
//!
//! A [`DraftSession`] is the `Idle -> Active -> Idle` state machine of one
//! editing session: opening it starts the session's own timer and registers
//! the teardown hook, closing it stops both. Sessions are plain constructible
//! objects; nothing here is process-global. No two sessions share a timer.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use crate::manager::DraftManager;
use crate::model::{AttachmentMeta, DraftId, DraftPatch, FieldValue, NaturalKey};
use crate::store::{encode_content, DraftStore, StoreError};

pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    interval: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

impl AutosaveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// What the form hands the engine: the current content-relevant state.
/// Volatile UI-only state (focus, validation hints, row ids) stays outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSnapshot {
    /// Derived dedup key, e.g. the slug of the current title.
    pub natural_key: Option<NaturalKey>,
    pub fields: BTreeMap<String, FieldValue>,
    pub attachments: BTreeMap<String, AttachmentMeta>,
}

/// The editing form as seen by the scheduler.
///
/// The form also owns the semantic emptiness predicate: only it knows
/// whether a snapshot is real content or untouched placeholders.
pub trait FormBridge: Send + Sync {
    fn snapshot(&self) -> FormSnapshot;
    fn is_blank(&self, snapshot: &FormSnapshot) -> bool;
}

pub type TeardownHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(u64);

/// Port over the host's "process is abruptly ending" signal.
///
/// Hosts implement this for their platform (process-exit hook, OS lifecycle
/// callback, ...). The signal fires at most once per session lifetime;
/// registered hooks must be invoked synchronously on it.
pub trait TeardownSignal: Send + Sync {
    fn register(&self, hook: TeardownHook) -> HookHandle;
    fn deregister(&self, handle: HookHandle);
}

/// [`TeardownSignal`] driven by the embedder calling [`ManualTeardown::fire`].
/// Useful for hosts with their own signal plumbing, and for tests.
#[derive(Default)]
pub struct ManualTeardown {
    hooks: StdMutex<BTreeMap<u64, TeardownHook>>,
    next_handle: AtomicU64,
}

impl ManualTeardown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invokes every registered hook synchronously.
    pub fn fire(&self) {
        let hooks: Vec<TeardownHook> = self
            .hooks
            .lock()
            .expect("teardown hooks lock poisoned")
            .values()
            .cloned()
            .collect();
        for hook in hooks {
            hook();
        }
    }
}

impl TeardownSignal for ManualTeardown {
    fn register(&self, hook: TeardownHook) -> HookHandle {
        let handle = HookHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.hooks
            .lock()
            .expect("teardown hooks lock poisoned")
            .insert(handle.0, hook);
        handle
    }

    fn deregister(&self, handle: HookHandle) {
        self.hooks
            .lock()
            .expect("teardown hooks lock poisoned")
            .remove(&handle.0);
    }
}

#[derive(Debug, Default)]
struct TickState {
    /// Draft id resolved by the first accepted tick; all later ticks update
    /// this entry instead of forking a second draft.
    pinned: Option<DraftId>,
    /// Canonical serialization of the last persisted content.
    last_encoded: Option<String>,
}

struct SessionShared {
    manager: Arc<Mutex<DraftManager>>,
    form: Arc<dyn FormBridge>,
    store: DraftStore,
    state: StdMutex<TickState>,
}

/// One active editing session.
pub struct DraftSession {
    shared: Arc<SessionShared>,
    teardown: Arc<dyn TeardownSignal>,
    hook: Option<HookHandle>,
    shutdown: watch::Sender<bool>,
    ticker: Option<JoinHandle<()>>,
}

impl DraftSession {
    /// Opens the session: starts this session's timer, registers the
    /// teardown hook, and clears the serialized-content cache. Pass the id
    /// from a resumed draft so the first tick updates that entry.
    pub async fn open(
        manager: Arc<Mutex<DraftManager>>,
        form: Arc<dyn FormBridge>,
        teardown: Arc<dyn TeardownSignal>,
        config: AutosaveConfig,
        resume_id: Option<DraftId>,
    ) -> Self {
        let store = manager.lock().await.store().clone();
        let shared = Arc::new(SessionShared {
            manager,
            form,
            store,
            state: StdMutex::new(TickState {
                pinned: resume_id,
                last_encoded: None,
            }),
        });

        let hook_shared = shared.clone();
        let hook = teardown.register(Arc::new(move || write_fallback_snapshot(&hook_shared)));

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let tick_shared = shared.clone();
        let period = config.interval;
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; consume it so
            // the first autosave lands one full period after open.
            interval.tick().await;
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => autosave_tick(&tick_shared).await,
                }
            }
        });

        Self {
            shared,
            teardown,
            hook: Some(hook),
            shutdown,
            ticker: Some(ticker),
        }
    }

    pub fn pinned_draft_id(&self) -> Option<DraftId> {
        self.shared
            .state
            .lock()
            .expect("session state lock poisoned")
            .pinned
            .clone()
    }

    /// Explicit "save as draft". Unlike ticks this surfaces the persist
    /// failure, so the UI can show its single non-blocking notification.
    /// A semantically blank form saves nothing and returns `Ok(None)`.
    pub async fn save_now(&self) -> Result<Option<DraftId>, StoreError> {
        let snapshot = self.shared.form.snapshot();
        if self.shared.form.is_blank(&snapshot) {
            return Ok(None);
        }
        let encoded = encode_content(&snapshot.fields, &snapshot.attachments)?;
        let pinned = self
            .shared
            .state
            .lock()
            .expect("session state lock poisoned")
            .pinned
            .clone();
        let patch = patch_from_snapshot(snapshot, pinned);

        let draft_id = self.shared.manager.lock().await.save_draft(patch).await?;

        let mut state = self.shared.state.lock().expect("session state lock poisoned");
        state.pinned = Some(draft_id.clone());
        state.last_encoded = Some(encoded);
        Ok(Some(draft_id))
    }

    /// Closes the session: stops the timer, deregisters the teardown hook,
    /// discards the pinned id. A write already in flight may complete but
    /// has no further effect. Normal closes never populate the fallback
    /// slot.
    pub async fn close(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.await;
        }
        if let Some(hook) = self.hook.take() {
            self.teardown.deregister(hook);
        }
        let mut state = self.shared.state.lock().expect("session state lock poisoned");
        state.pinned = None;
        state.last_encoded = None;
    }
}

impl Drop for DraftSession {
    fn drop(&mut self) {
        if let Some(hook) = self.hook.take() {
            self.teardown.deregister(hook);
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

async fn autosave_tick(shared: &SessionShared) {
    let snapshot = shared.form.snapshot();
    if shared.form.is_blank(&snapshot) {
        return;
    }

    let encoded = match encode_content(&snapshot.fields, &snapshot.attachments) {
        Ok(encoded) => encoded,
        Err(err) => {
            warn!(error = %err, "snapshot serialization failed; tick skipped");
            return;
        }
    };

    let (unchanged, pinned) = {
        let state = shared.state.lock().expect("session state lock poisoned");
        (
            state.last_encoded.as_deref() == Some(encoded.as_str()),
            state.pinned.clone(),
        )
    };
    if unchanged {
        // No content write needed, but a persist that failed on an earlier
        // tick still gets its retry here.
        shared.manager.lock().await.flush().await;
        return;
    }

    let patch = patch_from_snapshot(snapshot, pinned);
    let draft_id = shared.manager.lock().await.upsert(patch).await;

    let mut state = shared.state.lock().expect("session state lock poisoned");
    state.pinned = Some(draft_id);
    state.last_encoded = Some(encoded);
}

fn patch_from_snapshot(snapshot: FormSnapshot, pinned: Option<DraftId>) -> DraftPatch {
    DraftPatch {
        draft_id: pinned,
        natural_key: snapshot.natural_key,
        fields: snapshot.fields,
        attachments: snapshot.attachments,
    }
}

/// The emergency path: pull one last snapshot and push it into the slot with
/// the synchronous primitive. The primary async write triggered by the same
/// teardown may never complete before the process dies.
fn write_fallback_snapshot(shared: &SessionShared) {
    let snapshot = shared.form.snapshot();
    if shared.form.is_blank(&snapshot) {
        return;
    }
    let pinned = shared
        .state
        .lock()
        .expect("session state lock poisoned")
        .pinned
        .clone();
    let patch = patch_from_snapshot(snapshot, pinned);
    if let Err(err) = shared.store.write_fallback(&patch) {
        warn!(error = %err, "fallback slot write failed at teardown");
    }
}
