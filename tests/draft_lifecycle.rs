// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end lifecycle over a real on-disk folder: edit, save, crash,
//! recover, resume. Timer-driven behavior is covered by the scheduler's own
//! tests; here every save is explicit so the test is deterministic.

use std::collections::BTreeMap;
use std::env;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::Mutex;

use proteus::autosave::{AutosaveConfig, DraftSession, FormBridge, FormSnapshot, ManualTeardown};
use proteus::manager::DraftManager;
use proteus::model::{natural_key_from_title, FieldValue};
use proteus::resume::materialize;
use proteus::store::{DraftFolder, DraftStore, FallbackSlot};

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let mut path = env::temp_dir();
        path.push(format!("proteus-{prefix}-{}-{nanos}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[derive(Default)]
struct ScriptedForm {
    snapshot: StdMutex<FormSnapshot>,
}

impl ScriptedForm {
    fn set_title(&self, title: &str) {
        let mut snapshot = self.snapshot.lock().unwrap();
        snapshot.natural_key = natural_key_from_title(title);
        snapshot
            .fields
            .insert("title".to_owned(), FieldValue::Text(title.to_owned()));
    }

    fn set_field(&self, name: &str, value: FieldValue) {
        self.snapshot
            .lock()
            .unwrap()
            .fields
            .insert(name.to_owned(), value);
    }

    fn load(&self, natural_key: Option<proteus::model::NaturalKey>, fields: BTreeMap<String, FieldValue>) {
        let mut snapshot = self.snapshot.lock().unwrap();
        snapshot.natural_key = natural_key;
        snapshot.fields = fields;
    }
}

impl FormBridge for ScriptedForm {
    fn snapshot(&self) -> FormSnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    fn is_blank(&self, snapshot: &FormSnapshot) -> bool {
        snapshot.attachments.is_empty()
            && snapshot.fields.values().all(|value| match value {
                FieldValue::Text(text) | FieldValue::RichText(text) => text.trim().is_empty(),
                FieldValue::Rows(rows) => rows.is_empty(),
                FieldValue::Number(_) | FieldValue::Flag(_) => false,
            })
    }
}

// Long enough that no tick fires while the test runs.
fn explicit_save_config() -> AutosaveConfig {
    AutosaveConfig::new().with_interval(Duration::from_secs(3_600))
}

async fn manager_over(folder: &DraftFolder) -> Arc<Mutex<DraftManager>> {
    let mut manager = DraftManager::new(DraftStore::folder(folder.clone()));
    manager.load().await;
    Arc::new(Mutex::new(manager))
}

#[tokio::test]
async fn save_crash_recover_resume_round_trip() {
    let tmp = TempDir::new("lifecycle");
    let folder = DraftFolder::new(tmp.path().join("drafts"));

    // First launch: the user types, saves explicitly, keeps typing, and the
    // process is torn down before the next save.
    let draft_id = {
        let manager = manager_over(&folder).await;
        let form = Arc::new(ScriptedForm::default());
        let teardown = Arc::new(ManualTeardown::new());
        form.set_title("Backend Engineer");

        let session = DraftSession::open(
            manager.clone(),
            form.clone(),
            teardown.clone(),
            explicit_save_config(),
            None,
        )
        .await;

        let draft_id = session
            .save_now()
            .await
            .unwrap()
            .expect("non-blank form saves");

        form.set_field("location", FieldValue::Text("Berlin".to_owned()));
        teardown.fire();
        assert!(folder.read().unwrap().is_some());
        drop(session);
        draft_id
    };

    // Second launch: load reconciles the fallback slot into the same draft
    // and clears it.
    let manager = manager_over(&folder).await;
    {
        let manager = manager.lock().await;
        assert_eq!(manager.len(), 1);
        let draft = manager.get(&draft_id).expect("recovered under the same id");
        assert_eq!(
            draft.fields().get("title"),
            Some(&FieldValue::Text("Backend Engineer".to_owned())),
        );
        assert_eq!(
            draft.fields().get("location"),
            Some(&FieldValue::Text("Berlin".to_owned())),
        );
    }
    assert!(folder.read().unwrap().is_none());

    // Resume: materialize the draft into a fresh form and keep editing under
    // the pinned id.
    let form = Arc::new(ScriptedForm::default());
    let resumed = {
        let manager = manager.lock().await;
        materialize(manager.get(&draft_id).unwrap())
    };
    form.load(resumed.natural_key.clone(), resumed.fields.clone());
    form.set_field("remote", FieldValue::Flag(true));

    let teardown = Arc::new(ManualTeardown::new());
    let session = DraftSession::open(
        manager.clone(),
        form,
        teardown,
        explicit_save_config(),
        Some(resumed.draft_id.clone()),
    )
    .await;
    let saved = session.save_now().await.unwrap().expect("content saved");
    session.close().await;

    assert_eq!(saved, draft_id);
    let manager = manager.lock().await;
    assert_eq!(manager.len(), 1);
    assert_eq!(
        manager.get(&draft_id).unwrap().fields().get("remote"),
        Some(&FieldValue::Flag(true)),
    );
}

#[tokio::test]
async fn commit_flow_clears_the_draft_by_natural_key() {
    let tmp = TempDir::new("commit");
    let folder = DraftFolder::new(tmp.path().join("drafts"));

    let manager = manager_over(&folder).await;
    let form = Arc::new(ScriptedForm::default());
    let teardown = Arc::new(ManualTeardown::new());
    form.set_title("Product Designer");

    let session = DraftSession::open(
        manager.clone(),
        form.clone(),
        teardown,
        explicit_save_config(),
        None,
    )
    .await;
    session.save_now().await.unwrap().expect("content saved");
    session.close().await;

    // The backend accepted the record; the local draft is obsolete.
    let key = natural_key_from_title("Product Designer").unwrap();
    manager.lock().await.delete_by_natural_key(&key).await;

    let manager = manager_over(&folder).await;
    assert!(manager.lock().await.is_empty());
}
