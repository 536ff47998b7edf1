// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus — local draft persistence and autosave engine.
//!
//! The crate is a single-crate layout: `model` holds drafts and merge rules,
//! `store` the persistence ports and media, `manager` the in-memory list
//! authority, `autosave` the per-session scheduler and teardown hook, and
//! `resume` the draft-to-form materializer.

pub mod autosave;
pub mod manager;
pub mod model;
pub mod resume;
pub mod store;
