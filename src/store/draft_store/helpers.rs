// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#[derive(Debug, Serialize, Deserialize)]
struct DraftListJson {
    drafts: Vec<DraftJson>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DraftJson {
    draft_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    natural_key: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, FieldValueJson>,
    #[serde(default)]
    attachments: BTreeMap<String, AttachmentMetaJson>,
    #[serde(default)]
    updated_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum FieldValueJson {
    Text { value: String },
    Number { value: f64 },
    Flag { value: bool },
    RichText { value: String },
    Rows { rows: Vec<SubRecordJson> },
}

// Row ids are UI-only; rows persist as bare field maps.
#[derive(Debug, Serialize, Deserialize)]
struct SubRecordJson {
    #[serde(default)]
    fields: BTreeMap<String, FieldValueJson>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AttachmentMetaJson {
    name: String,
    mime_type: String,
    size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PatchJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    draft_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    natural_key: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, FieldValueJson>,
    #[serde(default)]
    attachments: BTreeMap<String, AttachmentMetaJson>,
}

fn field_value_to_json(value: &FieldValue) -> FieldValueJson {
    match value {
        FieldValue::Text(value) => FieldValueJson::Text {
            value: value.clone(),
        },
        FieldValue::Number(value) => FieldValueJson::Number { value: *value },
        FieldValue::Flag(value) => FieldValueJson::Flag { value: *value },
        FieldValue::RichText(value) => FieldValueJson::RichText {
            value: value.clone(),
        },
        FieldValue::Rows(rows) => FieldValueJson::Rows {
            rows: rows
                .iter()
                .map(|row| SubRecordJson {
                    fields: fields_to_json(row.fields()),
                })
                .collect(),
        },
    }
}

fn field_value_from_json(value: FieldValueJson) -> FieldValue {
    match value {
        FieldValueJson::Text { value } => FieldValue::Text(value),
        FieldValueJson::Number { value } => FieldValue::Number(value),
        FieldValueJson::Flag { value } => FieldValue::Flag(value),
        FieldValueJson::RichText { value } => FieldValue::RichText(value),
        FieldValueJson::Rows { rows } => FieldValue::Rows(
            rows.into_iter()
                .map(|row| SubRecord::fresh(fields_from_json(row.fields)))
                .collect(),
        ),
    }
}

fn fields_to_json(fields: &BTreeMap<String, FieldValue>) -> BTreeMap<String, FieldValueJson> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), field_value_to_json(value)))
        .collect()
}

fn fields_from_json(fields: BTreeMap<String, FieldValueJson>) -> BTreeMap<String, FieldValue> {
    fields
        .into_iter()
        .map(|(name, value)| (name, field_value_from_json(value)))
        .collect()
}

fn attachments_to_json(
    attachments: &BTreeMap<String, AttachmentMeta>,
) -> BTreeMap<String, AttachmentMetaJson> {
    attachments
        .iter()
        .map(|(slot, meta)| {
            (
                slot.clone(),
                AttachmentMetaJson {
                    name: meta.name().to_owned(),
                    mime_type: meta.mime_type().to_owned(),
                    size: meta.size(),
                },
            )
        })
        .collect()
}

fn attachments_from_json(
    attachments: BTreeMap<String, AttachmentMetaJson>,
) -> BTreeMap<String, AttachmentMeta> {
    attachments
        .into_iter()
        .map(|(slot, meta)| {
            (
                slot,
                AttachmentMeta::new(meta.name, meta.mime_type, meta.size),
            )
        })
        .collect()
}

fn draft_to_json(draft: &Draft) -> DraftJson {
    DraftJson {
        draft_id: draft.draft_id().to_string(),
        natural_key: draft.natural_key().map(ToString::to_string),
        fields: fields_to_json(draft.fields()),
        attachments: attachments_to_json(draft.attachments()),
        updated_at: draft.updated_at(),
    }
}

fn draft_from_json(draft_json: DraftJson) -> Result<Draft, StoreError> {
    let draft_id =
        DraftId::new(draft_json.draft_id.clone()).map_err(|source| StoreError::InvalidId {
            field: "drafts[].draft_id",
            value: draft_json.draft_id,
            source: Box::new(source),
        })?;

    let natural_key = draft_json
        .natural_key
        .map(|raw| {
            NaturalKey::new(raw.clone()).map_err(|source| StoreError::InvalidId {
                field: "drafts[].natural_key",
                value: raw,
                source: Box::new(source),
            })
        })
        .transpose()?;

    let mut draft = Draft::new(draft_id);
    draft.set_natural_key(natural_key);
    *draft.fields_mut() = fields_from_json(draft_json.fields);
    *draft.attachments_mut() = attachments_from_json(draft_json.attachments);
    draft.set_updated_at(draft_json.updated_at);
    Ok(draft)
}

fn encode_draft_list(drafts: &[Draft]) -> Result<String, StoreError> {
    let list_json = DraftListJson {
        drafts: drafts.iter().map(draft_to_json).collect(),
    };
    let payload = serde_json::to_string_pretty(&list_json).map_err(|source| StoreError::Json {
        context: "draft list",
        source,
    })?;
    Ok(format!("{payload}\n"))
}

fn decode_draft_list(payload: &str) -> Result<Vec<Draft>, StoreError> {
    let list_json: DraftListJson =
        serde_json::from_str(payload).map_err(|source| StoreError::Json {
            context: "draft list",
            source,
        })?;
    list_json
        .drafts
        .into_iter()
        .map(draft_from_json)
        .collect()
}

fn encode_patch(patch: &DraftPatch) -> Result<String, StoreError> {
    let patch_json = PatchJson {
        draft_id: patch.draft_id.as_ref().map(ToString::to_string),
        natural_key: patch.natural_key.as_ref().map(ToString::to_string),
        fields: fields_to_json(&patch.fields),
        attachments: attachments_to_json(&patch.attachments),
    };
    serde_json::to_string(&patch_json).map_err(|source| StoreError::Json {
        context: "fallback slot",
        source,
    })
}

fn decode_patch(payload: &str) -> Result<DraftPatch, StoreError> {
    let patch_json: PatchJson =
        serde_json::from_str(payload).map_err(|source| StoreError::Json {
            context: "fallback slot",
            source,
        })?;

    let draft_id = patch_json
        .draft_id
        .map(|raw| {
            DraftId::new(raw.clone()).map_err(|source| StoreError::InvalidId {
                field: "fallback.draft_id",
                value: raw,
                source: Box::new(source),
            })
        })
        .transpose()?;

    let natural_key = patch_json
        .natural_key
        .map(|raw| {
            NaturalKey::new(raw.clone()).map_err(|source| StoreError::InvalidId {
                field: "fallback.natural_key",
                value: raw,
                source: Box::new(source),
            })
        })
        .transpose()?;

    Ok(DraftPatch {
        draft_id,
        natural_key,
        fields: fields_from_json(patch_json.fields),
        attachments: attachments_from_json(patch_json.attachments),
    })
}

/// Canonical serialization of the content-relevant parts of a snapshot.
///
/// Row ids never reach the payload, so two snapshots that differ only in
/// ephemeral UI state encode identically. The scheduler compares this string
/// against its per-session cache to skip unchanged-content ticks.
pub fn encode_content(
    fields: &BTreeMap<String, FieldValue>,
    attachments: &BTreeMap<String, AttachmentMeta>,
) -> Result<String, StoreError> {
    #[derive(Serialize)]
    struct ContentJson {
        fields: BTreeMap<String, FieldValueJson>,
        attachments: BTreeMap<String, AttachmentMetaJson>,
    }

    let content = ContentJson {
        fields: fields_to_json(fields),
        attachments: attachments_to_json(attachments),
    };
    serde_json::to_string(&content).map_err(|source| StoreError::Json {
        context: "content fingerprint",
        source,
    })
}
