/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::consts::{CONTENT_TYPES, DEFAULT_CONTENT_TYPE, PREVIEW_NAMESPACE};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {0} not found")]
    NotFound(String),
    #[error("invalid key `{0}`")]
    InvalidKey(String),
    #[error("i/o error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    fn io(key: &str, source: std::io::Error) -> Self {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Key-addressed blob storage. Keys are slash-delimited and relative; the
/// store knows nothing about projects or hierarchy and offers no atomicity
/// across keys.
#[async_trait]
pub trait ContentStore: Send + Sync + fmt::Debug {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;
    /// Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
}

pub fn content_key(project: Uuid, path: &str) -> String {
    format!("{}/{}", project, path)
}

pub fn preview_key(project: Uuid, build: Uuid, path: &str) -> String {
    format!("{}/{}/{}/{}", PREVIEW_NAMESPACE, project, build, path)
}

pub fn content_type_for(path: &str) -> &'static str {
    let extension = match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => ext.to_ascii_lowercase(),
        _ => return DEFAULT_CONTENT_TYPE,
    };

    CONTENT_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map_or(DEFAULT_CONTENT_TYPE, |(_, content_type)| content_type)
}

fn check_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Filesystem backend. Writes go to a staging file first and are renamed
/// into place, so readers never observe a partially written object.
#[derive(Debug)]
pub struct LocalContentStore {
    root: PathBuf,
    staging: PathBuf,
}

impl LocalContentStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let staging = root.join(".staging");

        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| StoreError::io(&staging.display().to_string(), e))?;

        Ok(LocalContentStore { root, staging })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }

    /// Removes directories emptied by a delete, stopping at the first one
    /// that still has entries or at the store root.
    async fn prune_parents(&self, target: &Path) {
        let mut dir = target.parent();

        while let Some(current) = dir {
            if current == self.root || tokio::fs::remove_dir(current).await.is_err() {
                break;
            }

            dir = current.parent();
        }
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> Result<(), StoreError> {
        let target = self.resolve(key)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(key, e))?;
        }

        // An empty directory left behind by earlier deletes may occupy the key.
        if let Ok(metadata) = tokio::fs::metadata(&target).await {
            if metadata.is_dir() {
                tokio::fs::remove_dir(&target)
                    .await
                    .map_err(|e| StoreError::io(key, e))?;
            }
        }

        let staged = self.staging.join(Uuid::new_v4().to_string());
        tokio::fs::write(&staged, &data)
            .await
            .map_err(|e| StoreError::io(key, e))?;

        if let Err(e) = tokio::fs::rename(&staged, &target).await {
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(StoreError::io(key, e));
        }

        debug!(key, size = data.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let target = self.resolve(key)?;

        match tokio::fs::read(&target).await {
            Ok(data) => Ok(StoredObject {
                data: Bytes::from(data),
                content_type: content_type_for(key).to_string(),
            }),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let target = self.resolve(key)?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io(key, e)),
        }

        self.prune_parents(&target).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let target = self.resolve(key)?;

        match tokio::fs::metadata(&target).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }
}

/// In-process backend for single-node development and tests. Each operation
/// class can be switched to fail, which simulates an unreachable store.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    fail_puts: AtomicBool,
    fail_gets: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryContentStore {
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Sorted keys starting with `prefix`.
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn check_available(flag: &AtomicBool, operation: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{} rejected", operation)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StoreError> {
        check_key(key)?;
        Self::check_available(&self.fail_puts, "put")?;

        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key.to_string(),
                StoredObject {
                    data,
                    content_type: content_type.to_string(),
                },
            );

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        check_key(key)?;
        Self::check_available(&self.fail_gets, "get")?;

        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        check_key(key)?;
        Self::check_available(&self.fail_deletes, "delete")?;

        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        check_key(key)?;
        Self::check_available(&self.fail_gets, "exists")?;

        Ok(self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key))
    }
}
