// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core draft data model.
//!
//! Drafts are snapshots of in-progress entity content: a field map, attachment
//! metadata, and the timestamps/keys the manager needs for dedup and eviction.

pub mod draft;
pub mod ids;
pub mod merge;

pub use draft::{AttachmentMeta, Draft, DraftPatch, FieldValue, SubRecord};
pub use ids::{natural_key_from_title, DraftId, Id, IdError, NaturalKey, RowId};
pub use merge::merge_patch;
