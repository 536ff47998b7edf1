// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::draft_folder::DraftFolder;
use super::medium::{DraftMedium, FallbackSlot};
use super::StoreError;
use crate::model::{
    AttachmentMeta, Draft, DraftId, DraftPatch, FieldValue, NaturalKey, SubRecord,
};

/// Thin async persistence layer over a [`DraftMedium`] plus its companion
/// [`FallbackSlot`].
///
/// The store never throws a read failure at its caller: `load_all` degrades
/// to an empty list with a logged warning. Writes report their failure as a
/// `Result`; the manager downgrades autosave writes to warnings and only the
/// explicit save path surfaces them.
#[derive(Clone)]
pub struct DraftStore {
    medium: Arc<dyn DraftMedium>,
    slot: Arc<dyn FallbackSlot>,
}

impl DraftStore {
    pub fn new(medium: Arc<dyn DraftMedium>, slot: Arc<dyn FallbackSlot>) -> Self {
        Self { medium, slot }
    }

    /// Convenience constructor: one [`DraftFolder`] serving both keys.
    pub fn folder(folder: DraftFolder) -> Self {
        let shared = Arc::new(folder);
        Self::new(shared.clone(), shared)
    }

    pub async fn load_all(&self) -> Vec<Draft> {
        let payload = match self.medium.read_list().await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "draft list read failed; starting with an empty list");
                return Vec::new();
            }
        };

        match decode_draft_list(&payload) {
            Ok(drafts) => drafts,
            Err(err) => {
                warn!(error = %err, "draft list payload malformed; starting with an empty list");
                Vec::new()
            }
        }
    }

    /// Replace-all write of the serialized list.
    pub async fn save_all(&self, drafts: &[Draft]) -> Result<(), StoreError> {
        let payload = encode_draft_list(drafts)?;
        self.medium.write_list(&payload).await
    }

    /// Synchronous emergency write into the fallback slot.
    pub fn write_fallback(&self, patch: &DraftPatch) -> Result<(), StoreError> {
        let payload = encode_patch(patch)?;
        self.slot.write_now(&payload)
    }

    /// Reads and clears the fallback slot.
    ///
    /// A malformed or empty payload is discarded with a warning; the slot is
    /// cleared either way so a bad payload cannot wedge every startup.
    pub fn take_fallback(&self) -> Option<DraftPatch> {
        let payload = match self.slot.read() {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "fallback slot read failed");
                return None;
            }
        };

        if let Err(err) = self.slot.clear() {
            warn!(error = %err, "fallback slot clear failed");
        }

        match decode_patch(&payload) {
            Ok(patch) if patch.is_empty() => None,
            Ok(patch) => Some(patch),
            Err(err) => {
                warn!(error = %err, "fallback slot payload malformed; discarded");
                None
            }
        }
    }
}

// Persisted JSON shapes and model conversions.
include!("draft_store/helpers.rs");
