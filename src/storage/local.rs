use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// A blob written by [`BlobStore::store`]
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Absolute location on disk
    pub path: PathBuf,
    /// `<timestamp>-<original name>`, unique inside the store root
    pub stored_name: String,
    pub size: u64,
}

/// Local file system blob store rooted at one upload directory
pub struct BlobStore {
    root: PathBuf,
    last_stamp: AtomicI64,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self {
            root: normalize(&root),
            last_stamp: AtomicI64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a blob previously written under `stored_name`
    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }

    /// Wall-clock milliseconds, bumped so that no two calls return the same value.
    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self.last_stamp.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Stream `source` into a new blob named after `original_name`.
    ///
    /// A read error on `source` is reported as a validation error (the client sent
    /// a broken body); the partial file is removed before returning.
    pub async fn store<S, E>(&self, source: S, original_name: &str) -> Result<StoredBlob>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let mut source = std::pin::pin!(source);
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create upload directory {:?}: {}",
                self.root, e
            ))
        })?;

        let (stored_name, path, mut file) = loop {
            let stored_name = format!("{}-{}", self.next_stamp(), original_name);
            let path = self.root.join(&stored_name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => break (stored_name, path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(AppError::Storage(format!(
                        "Failed to create blob {:?}: {}",
                        path, e
                    )))
                }
            }
        };

        let mut size = 0u64;
        let written: Result<()> = async {
            while let Some(chunk) = source.next().await {
                let chunk = chunk.map_err(|e| {
                    AppError::Validation(format!("Failed to read upload stream: {}", e))
                })?;
                file.write_all(&chunk).await.map_err(|e| {
                    AppError::Storage(format!("Failed to write blob {:?}: {}", path, e))
                })?;
                size += chunk.len() as u64;
            }
            file.flush()
                .await
                .map_err(|e| AppError::Storage(format!("Failed to flush blob {:?}: {}", path, e)))
        }
        .await;
        drop(file);

        if let Err(e) = written {
            if let Err(rm) = fs::remove_file(&path).await {
                tracing::warn!("Failed to remove partial blob {:?}: {}", path, rm);
            }
            return Err(e);
        }

        tracing::debug!("Saved blob {:?} ({} bytes)", path, size);
        Ok(StoredBlob {
            path,
            stored_name,
            size,
        })
    }

    /// Delete one blob. A missing file is an error.
    pub async fn remove(&self, path: &Path) -> Result<()> {
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !path.starts_with(&self.root) {
            return Err(AppError::Storage(format!(
                "Refusing to remove {:?}: outside upload directory {:?}",
                path, self.root
            )));
        }

        fs::remove_file(path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to remove blob {:?}: {}", path, e)))?;
        tracing::debug!("Deleted blob {:?}", path);
        Ok(())
    }

    /// Best-effort removal used to undo a blob write whose record was never committed
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = self.remove(path).await {
            tracing::warn!("Failed to discard uncommitted blob: {}", e);
        }
    }
}

/// Resolve `.` and `..` lexically, so blob paths built from the root never contain them
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
