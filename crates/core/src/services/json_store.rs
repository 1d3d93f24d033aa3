//! Whole-document JSON files.
//!
//! Every access reads the full document; every update rewrites it. Updates
//! within the process are serialized by a mutex and land via a sibling temp
//! file plus rename, so readers never see a half-written document. An update
//! never replaces a document it could not read.

use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use fichajes_common::{AppError, AppResult};

/// A JSON document on disk holding a `T`.
pub struct JsonFile<T> {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonFile<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            write_lock: Arc::clone(&self.write_lock),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for JsonFile<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFile").field("path", &self.path).finish()
    }
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default + Send,
{
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. A missing or unreadable file reads as `T::default()`.
    pub async fn read(&self) -> T {
        self.load().await.unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to read store, using empty document");
            T::default()
        })
    }

    /// Read the document strictly. Only a missing or empty file is `T::default()`.
    pub async fn load(&self) -> AppResult<T> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Storage(format!("corrupt document {}: {e}", self.path.display()))
        })
    }

    /// Read, modify and write back under the store's lock.
    pub async fn update<R, F>(&self, mutate: F) -> AppResult<R>
    where
        F: FnOnce(&mut T) -> R + Send,
        R: Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut doc = self.load().await?;
        let result = mutate(&mut doc);
        self.write(&doc).await?;

        Ok(result)
    }

    async fn write(&self, doc: &T) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}
