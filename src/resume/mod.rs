// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Turning a stored draft back into editable form state.

use std::collections::BTreeMap;

use crate::model::{AttachmentMeta, Draft, DraftId, FieldValue, NaturalKey, SubRecord};

/// Editable form state rebuilt from a stored draft.
///
/// Carries the draft id so the session that opens over it can pin its first
/// tick to the same entry instead of forking a duplicate.
#[derive(Debug, Clone)]
pub struct ResumedForm {
    pub draft_id: DraftId,
    pub natural_key: Option<NaturalKey>,
    pub fields: BTreeMap<String, FieldValue>,
    pub attachments: BTreeMap<String, AttachmentMeta>,
}

/// Rebuilds form state from a draft, byte-for-byte on content.
///
/// Repeating sub-records come back with freshly generated row ids; the
/// stored draft never carries them, and two resumes of the same draft must
/// not collide on ids the UI treats as unique.
pub fn materialize(draft: &Draft) -> ResumedForm {
    ResumedForm {
        draft_id: draft.draft_id().clone(),
        natural_key: draft.natural_key().cloned(),
        fields: draft
            .fields()
            .iter()
            .map(|(name, value)| (name.clone(), with_fresh_row_ids(value)))
            .collect(),
        attachments: draft.attachments().clone(),
    }
}

fn with_fresh_row_ids(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Rows(rows) => FieldValue::Rows(
            rows.iter()
                .map(|row| SubRecord::fresh(row.fields().clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}
