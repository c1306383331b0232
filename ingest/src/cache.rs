//! On-disk store of raw item responses, one file per (post, category).
//!
//! Entries are write-once. A second write to the same key fails with
//! [`CacheError::WriteConflict`]; clear the directory when classification
//! rules change so stale entries are not reused. An entry appears complete
//! or not at all.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task;
use tracing::debug;
use trends_core::{CacheError, Category, CoreError};

#[derive(Debug, Clone)]
pub struct PostCache {
    dir: PathBuf,
}

impl PostCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn key(post_id: u64, category: Category) -> String {
        format!("{}-{}.json", post_id, category.as_str())
    }

    pub fn entry_path(&self, post_id: u64, category: Category) -> PathBuf {
        self.dir.join(Self::key(post_id, category))
    }

    pub async fn read(&self, post_id: u64, category: Category) -> Result<String, CoreError> {
        let path = self.entry_path(post_id, category);
        match fs::read_to_string(&path).await {
            Ok(body) => {
                debug!(path = %path.display(), "Cache hit");
                Ok(body)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::Miss {
                key: Self::key(post_id, category),
            }
            .into()),
            Err(e) if e.kind() == ErrorKind::InvalidData => Err(CacheError::Corrupt {
                key: Self::key(post_id, category),
                details: e.to_string(),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates the entry exclusively; an existing file is never overwritten.
    pub async fn write(&self, post_id: u64, category: Category, body: &str) -> Result<(), CoreError> {
        fs::create_dir_all(&self.dir).await?;

        let dir = self.dir.clone();
        let path = self.entry_path(post_id, category);
        let key = Self::key(post_id, category);
        let bytes = body.as_bytes().to_vec();
        task::spawn_blocking(move || persist_entry(&dir, &path, &bytes, &key))
            .await
            .map_err(|e| CoreError::Internal {
                message: format!("cache write task failed: {}", e),
            })??;

        debug!(
            path = %self.entry_path(post_id, category).display(),
            bytes = body.len(),
            "Cached item"
        );
        Ok(())
    }
}

/// The body goes to a temporary sibling first and is linked into place only
/// if `path` does not exist yet. A failed write leaves no entry behind.
fn persist_entry(dir: &Path, path: &Path, body: &[u8], key: &str) -> Result<(), CoreError> {
    let mut staged = tempfile::Builder::new()
        .prefix(".entry-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staged.write_all(body)?;
    staged.as_file().sync_all()?;

    staged.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            CacheError::WriteConflict {
                key: key.to_string(),
            }
            .into()
        } else {
            CoreError::Io(e.error)
        }
    })?;
    Ok(())
}
