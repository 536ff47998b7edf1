// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::StoreError;

/// Asynchronous port over the durable key holding the serialized draft list.
///
/// Any platform-appropriate persistent store qualifies; `DraftFolder` is the
/// file-backed implementation shipped with the crate.
#[async_trait]
pub trait DraftMedium: Send + Sync {
    /// Reads the serialized draft list. `Ok(None)` means the key was never
    /// written, which is not an error.
    async fn read_list(&self) -> Result<Option<String>, StoreError>;

    /// Replaces the serialized draft list. The whole list is the unit of
    /// persistence, not individual records.
    async fn write_list(&self, payload: &str) -> Result<(), StoreError>;
}

/// Synchronous port over the single dedicated fallback-slot key.
///
/// Writes happen on the teardown path where no async runtime may still be
/// driving futures, so every operation here is blocking by contract.
pub trait FallbackSlot: Send + Sync {
    fn write_now(&self, payload: &str) -> Result<(), StoreError>;
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory medium for tests and ephemeral hosts. Counts list writes and
/// can be switched into a failing mode to exercise the degraded paths.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    list: Mutex<Option<String>>,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn list_payload(&self) -> Option<String> {
        self.list.lock().expect("memory medium lock poisoned").clone()
    }

    pub fn set_list_payload(&self, payload: Option<String>) {
        *self.list.lock().expect("memory medium lock poisoned") = payload;
    }
}

#[async_trait]
impl DraftMedium for MemoryMedium {
    async fn read_list(&self) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable {
                context: "memory medium read",
            });
        }
        Ok(self.list.lock().expect("memory medium lock poisoned").clone())
    }

    async fn write_list(&self, payload: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable {
                context: "memory medium write",
            });
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        *self.list.lock().expect("memory medium lock poisoned") = Some(payload.to_owned());
        Ok(())
    }
}

/// In-memory fallback slot companion to [`MemoryMedium`].
#[derive(Debug, Default)]
pub struct MemorySlot {
    slot: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload(&self) -> Option<String> {
        self.slot.lock().expect("memory slot lock poisoned").clone()
    }

    pub fn set_payload(&self, payload: Option<String>) {
        *self.slot.lock().expect("memory slot lock poisoned") = payload;
    }
}

impl FallbackSlot for MemorySlot {
    fn write_now(&self, payload: &str) -> Result<(), StoreError> {
        *self.slot.lock().expect("memory slot lock poisoned") = Some(payload.to_owned());
        Ok(())
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot.lock().expect("memory slot lock poisoned").clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().expect("memory slot lock poisoned") = None;
        Ok(())
    }
}
