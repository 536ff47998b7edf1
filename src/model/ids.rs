// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A stable identifier used across the draft model and persisted payloads.
///
/// This is intentionally std-only and does not enforce a UUID format; it only
/// enforces that the value is non-empty and free of whitespace, because ids
/// and natural keys are used as exact-match dedup keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_id_value(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<T> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl<T> TryFrom<String> for Id<T> {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Empty,
    ContainsWhitespace,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("id must not be empty"),
            Self::ContainsWhitespace => f.write_str("id must not contain whitespace"),
        }
    }
}

impl std::error::Error for IdError {}

fn validate_id_value(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    if value.chars().any(char::is_whitespace) {
        return Err(IdError::ContainsWhitespace);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DraftIdTag {}
/// Opaque stable identifier of a draft, generated client-side when the draft
/// is first created and never reused across distinct drafts.
pub type DraftId = Id<DraftIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowIdTag {}
/// Ephemeral identifier of a sub-record row. Only meaningful to the current
/// rendering session; never persisted.
pub type RowId = Id<RowIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NaturalKeyTag {}
/// Derived stable string (e.g. a slug) used to deduplicate drafts before an
/// id-based match is possible.
pub type NaturalKey = Id<NaturalKeyTag>;

static GENERATED_IDS: AtomicU64 = AtomicU64::new(0);

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl DraftId {
    /// The process id keeps ids from two uncoordinated writers started in
    /// the same millisecond from colliding at counter zero.
    pub fn generate() -> Self {
        let counter = GENERATED_IDS.fetch_add(1, Ordering::Relaxed);
        Self::new(format!(
            "d:{:x}:{:x}:{counter:04x}",
            unix_millis(),
            std::process::id()
        ))
        .expect("generated draft id is valid")
    }
}

impl RowId {
    pub fn generate() -> Self {
        let counter = GENERATED_IDS.fetch_add(1, Ordering::Relaxed);
        Self::new(format!("r:{counter:x}")).expect("generated row id is valid")
    }
}

/// Derives a slug-style natural key from a display title.
///
/// Returns `None` when the title contains nothing usable, so callers fall
/// back to id-only dedup rather than sharing an empty key.
pub fn natural_key_from_title(title: &str) -> Option<NaturalKey> {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }

    NaturalKey::new(slug).ok()
}

#[cfg(test)]
mod tests {
    use super::{natural_key_from_title, DraftId, Id, IdError, RowId};

    #[test]
    fn id_rejects_empty() {
        let result: Result<Id<()>, _> = Id::new("");
        assert_eq!(result, Err(IdError::Empty));
    }

    #[test]
    fn id_rejects_whitespace() {
        let result: Result<Id<()>, _> = Id::new("a b");
        assert_eq!(result, Err(IdError::ContainsWhitespace));
    }

    #[test]
    fn generated_draft_ids_are_distinct() {
        let first = DraftId::generate();
        let second = DraftId::generate();
        assert_ne!(first, second);
    }

    #[test]
    fn generated_draft_ids_carry_the_process_identity() {
        let id = DraftId::generate();
        let mut parts = id.as_str().split(':');
        assert_eq!(parts.next(), Some("d"));
        assert!(parts.next().is_some());
        assert_eq!(
            parts.next(),
            Some(format!("{:x}", std::process::id()).as_str())
        );
        assert!(parts.next().is_some());
    }

    #[test]
    fn generated_row_ids_are_distinct() {
        let first = RowId::generate();
        let second = RowId::generate();
        assert_ne!(first, second);
    }

    #[test]
    fn natural_key_slugifies_titles() {
        let key = natural_key_from_title("Backend Engineer (Senior)").unwrap();
        assert_eq!(key.as_str(), "backend-engineer-senior");
    }

    #[test]
    fn natural_key_of_blank_title_is_none() {
        assert_eq!(natural_key_from_title("  --  "), None);
    }
}
