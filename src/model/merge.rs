// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Typed draft merge.
//!
//! Precedence rule: the patch wins field-by-field. A field or attachment slot
//! named by the patch replaces the base value wholesale (no recursive merge
//! into rows); fields the patch does not mention keep their base value. The
//! base draft always keeps its id. A natural key carried by the patch
//! replaces the base key; an absent patch key leaves the base key alone.

use super::draft::{Draft, DraftPatch};

pub fn merge_patch(base: &mut Draft, patch: &DraftPatch) {
    for (name, value) in &patch.fields {
        base.fields_mut().insert(name.clone(), value.clone());
    }
    for (slot, meta) in &patch.attachments {
        base.attachments_mut().insert(slot.clone(), meta.clone());
    }
    if patch.natural_key.is_some() {
        base.set_natural_key(patch.natural_key.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::merge_patch;
    use crate::model::{AttachmentMeta, Draft, DraftId, DraftPatch, FieldValue, NaturalKey};

    fn base_draft() -> Draft {
        let mut draft = Draft::new(DraftId::new("d:base").unwrap());
        draft.set_natural_key(Some(NaturalKey::new("backend-engineer").unwrap()));
        draft
            .fields_mut()
            .insert("title".to_owned(), FieldValue::Text("Backend Engineer".to_owned()));
        draft
            .fields_mut()
            .insert("summary".to_owned(), FieldValue::RichText("<p>Old</p>".to_owned()));
        draft
            .attachments_mut()
            .insert("hero".to_owned(), AttachmentMeta::new("hero.png", "image/png", 1024));
        draft
    }

    #[test]
    fn patch_wins_per_field_and_keeps_unmentioned_fields() {
        let mut draft = base_draft();
        let patch = DraftPatch {
            draft_id: None,
            natural_key: None,
            fields: BTreeMap::from([(
                "summary".to_owned(),
                FieldValue::RichText("<p>New</p>".to_owned()),
            )]),
            attachments: BTreeMap::new(),
        };

        merge_patch(&mut draft, &patch);

        assert_eq!(
            draft.fields().get("summary"),
            Some(&FieldValue::RichText("<p>New</p>".to_owned()))
        );
        assert_eq!(
            draft.fields().get("title"),
            Some(&FieldValue::Text("Backend Engineer".to_owned()))
        );
        assert_eq!(draft.draft_id().as_str(), "d:base");
    }

    #[test]
    fn patch_attachment_replaces_slot_wholesale() {
        let mut draft = base_draft();
        let patch = DraftPatch {
            attachments: BTreeMap::from([(
                "hero".to_owned(),
                AttachmentMeta::new("hero-v2.png", "image/png", 2048),
            )]),
            ..DraftPatch::default()
        };

        merge_patch(&mut draft, &patch);

        let meta = draft.attachments().get("hero").expect("hero slot");
        assert_eq!(meta.name(), "hero-v2.png");
        assert_eq!(meta.size(), 2048);
    }

    #[test]
    fn absent_patch_key_leaves_base_natural_key_alone() {
        let mut draft = base_draft();
        let patch = DraftPatch::default();

        merge_patch(&mut draft, &patch);

        assert_eq!(draft.natural_key().map(|k| k.as_str()), Some("backend-engineer"));
    }

    #[test]
    fn patch_key_replaces_base_natural_key() {
        let mut draft = base_draft();
        let patch = DraftPatch {
            natural_key: Some(NaturalKey::new("platform-engineer").unwrap()),
            ..DraftPatch::default()
        };

        merge_patch(&mut draft, &patch);

        assert_eq!(draft.natural_key().map(|k| k.as_str()), Some("platform-engineer"));
    }
}
