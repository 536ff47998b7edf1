// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for drafts.
//!
//! The store module is a dumb sink with no authority over content: the
//! medium exposes two logical keys (the serialized draft list and the single
//! fallback slot), and `DraftStore` translates between the model and the
//! persisted JSON payloads. Read failures degrade to an empty list; write
//! failures surface as `StoreError` and are downgraded to logged warnings by
//! the callers documented to do so.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::model::IdError;

pub mod draft_folder;
pub mod draft_store;
pub mod medium;

pub use draft_folder::{DraftFolder, WriteDurability};
pub use draft_store::{encode_content, DraftStore};
pub use medium::{DraftMedium, FallbackSlot, MemoryMedium, MemorySlot};

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        context: &'static str,
        source: serde_json::Error,
    },
    InvalidId {
        field: &'static str,
        value: String,
        source: Box<IdError>,
    },
    SymlinkRefused {
        path: PathBuf,
    },
    Unavailable {
        context: &'static str,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { context, source } => write!(f, "json error in {context}: {source}"),
            Self::InvalidId {
                field,
                value,
                source,
            } => write!(f, "invalid id for {field}: {value:?}: {source}"),
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
            Self::Unavailable { context } => write!(f, "storage medium unavailable: {context}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidId { source, .. } => Some(source),
            Self::SymlinkRefused { .. } => None,
            Self::Unavailable { .. } => None,
        }
    }
}
