// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::medium::{DraftMedium, FallbackSlot};
use super::StoreError;

const LIST_FILENAME: &str = "drafts.json";
const FALLBACK_FILENAME: &str = "drafts.fallback.json";

/// File-backed draft medium: one folder holding the draft list file and the
/// fallback slot file.
#[derive(Debug, Clone)]
pub struct DraftFolder {
    root: PathBuf,
    durability: WriteDurability,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable
    /// storage where possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

impl DraftFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn list_path(&self) -> PathBuf {
        self.root.join(LIST_FILENAME)
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.root.join(FALLBACK_FILENAME)
    }
}

#[async_trait]
impl DraftMedium for DraftFolder {
    async fn read_list(&self) -> Result<Option<String>, StoreError> {
        let list_path = self.list_path();
        match tokio::fs::read_to_string(&list_path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: list_path,
                source,
            }),
        }
    }

    async fn write_list(&self, payload: &str) -> Result<(), StoreError> {
        write_atomic_in_root(
            &self.root,
            &self.list_path(),
            payload.as_bytes(),
            self.durability,
        )
        .await
    }
}

impl FallbackSlot for DraftFolder {
    /// Plain synchronous write, no temp file. The slot is written while the
    /// process is tearing down and the primary async write for the same
    /// teardown may never complete, so this path stays as immediate as the
    /// platform allows.
    fn write_now(&self, payload: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let fallback_path = self.fallback_path();
        std::fs::write(&fallback_path, payload).map_err(|source| StoreError::Io {
            path: fallback_path,
            source,
        })
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        let fallback_path = self.fallback_path();
        match std::fs::read_to_string(&fallback_path) {
            Ok(payload) => Ok(Some(payload)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: fallback_path,
                source,
            }),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        let fallback_path = self.fallback_path();
        match std::fs::remove_file(&fallback_path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: fallback_path,
                source,
            }),
        }
    }
}

async fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match tokio::fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = tokio::fs::remove_file(to).await;
                tokio::fs::rename(from, to).await
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        tokio::fs::rename(from, to).await
    }
}

async fn write_atomic_in_root(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|source| StoreError::Io {
            path: root.to_path_buf(),
            source,
        })?;

    match tokio::fs::symlink_metadata(path).await {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = root.join(format!(
        ".proteus.tmp.{}.{}",
        file_name.to_string_lossy(),
        nanos
    ));

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .await
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    file.write_all(contents)
        .await
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    if durability == WriteDurability::Durable {
        file.sync_all().await.map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }
    drop(file);

    if let Err(source) = rename_overwrite(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = tokio::fs::File::open(root)
                .await
                .map_err(|source| StoreError::Io {
                    path: root.to_path_buf(),
                    source,
                })?;
            dir.sync_all().await.map_err(|source| StoreError::Io {
                path: root.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}
