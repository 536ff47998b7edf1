// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use super::ids::{DraftId, NaturalKey, RowId};

/// A single field value inside a draft.
///
/// Long-form content forms mix scalars, rich text, and repeating groups of
/// sub-records (e.g. salary bands or opening hours). Sub-record rows keep
/// their order; their row ids are UI-only and excluded from persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
    RichText(String),
    Rows(Vec<SubRecord>),
}

/// One row of a repeating field group.
#[derive(Debug, Clone, PartialEq)]
pub struct SubRecord {
    row_id: RowId,
    fields: BTreeMap<String, FieldValue>,
}

impl SubRecord {
    pub fn new(row_id: RowId, fields: BTreeMap<String, FieldValue>) -> Self {
        Self { row_id, fields }
    }

    /// Builds a row with a freshly generated ephemeral row id.
    pub fn fresh(fields: BTreeMap<String, FieldValue>) -> Self {
        Self::new(RowId::generate(), fields)
    }

    pub fn row_id(&self) -> &RowId {
        &self.row_id
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut BTreeMap<String, FieldValue> {
        &mut self.fields
    }
}

/// Metadata of an uploaded attachment. The binary payload itself is never
/// part of a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentMeta {
    name: String,
    mime_type: String,
    size: u64,
}

impl AttachmentMeta {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// A snapshot of in-progress entity content.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    draft_id: DraftId,
    natural_key: Option<NaturalKey>,
    fields: BTreeMap<String, FieldValue>,
    attachments: BTreeMap<String, AttachmentMeta>,
    updated_at: u64,
}

impl Draft {
    pub fn new(draft_id: DraftId) -> Self {
        Self {
            draft_id,
            natural_key: None,
            fields: BTreeMap::new(),
            attachments: BTreeMap::new(),
            updated_at: 0,
        }
    }

    pub fn draft_id(&self) -> &DraftId {
        &self.draft_id
    }

    pub fn natural_key(&self) -> Option<&NaturalKey> {
        self.natural_key.as_ref()
    }

    pub fn set_natural_key(&mut self, natural_key: Option<NaturalKey>) {
        self.natural_key = natural_key;
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut BTreeMap<String, FieldValue> {
        &mut self.fields
    }

    pub fn attachments(&self) -> &BTreeMap<String, AttachmentMeta> {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut BTreeMap<String, AttachmentMeta> {
        &mut self.attachments
    }

    /// Millis since the Unix epoch of the last accepted mutation.
    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    pub fn set_updated_at(&mut self, updated_at: u64) {
        self.updated_at = updated_at;
    }

    /// Stamps the draft with `now_ms`, never moving the timestamp backwards.
    pub fn touch(&mut self, now_ms: u64) {
        self.updated_at = self.updated_at.max(now_ms);
    }
}

/// A candidate snapshot handed to the manager by an autosave tick, an
/// explicit "save as draft" action, or fallback-slot reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPatch {
    /// The session's pinned draft id, when one exists.
    pub draft_id: Option<DraftId>,
    /// Derived dedup key; `None` when the form has no usable title yet.
    pub natural_key: Option<NaturalKey>,
    pub fields: BTreeMap<String, FieldValue>,
    pub attachments: BTreeMap<String, AttachmentMeta>,
}

impl DraftPatch {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.attachments.is_empty()
    }
}
