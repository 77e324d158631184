// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object storage seam.
//!
//! The filesystem implementation writes through a temp file and renames,
//! so a crash mid-write never leaves a truncated object. The bucket-backed
//! implementation of the cloud deployment is a collaborator behind the
//! same trait.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object write failed for {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes at a `/`-separated path, creating parents.
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let target = self.root.join(path);
        let bytes = bytes.to_vec();
        let path = path.to_string();

        tokio::task::spawn_blocking(move || -> Result<(), std::io::Error> {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let tmp = target.with_extension("tmp");
            std::fs::write(&tmp, &bytes)?;
            std::fs::rename(&tmp, &target)?;
            Ok(())
        })
        .await
        .map_err(|err| StoreError::Write {
            path: path.clone(),
            source: std::io::Error::other(err),
        })?
        .map_err(|source| StoreError::Write { path, source })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
