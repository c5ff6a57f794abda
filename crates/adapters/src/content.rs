// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bulk content backend: the staging and production document trees.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors from content operations
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("not found: {0}")]
    NotFound(String),
    /// The destination is checked out or otherwise write-protected
    #[error("locked: {0}")]
    Locked(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContentError {
    pub fn is_locked(&self) -> bool {
        matches!(self, ContentError::Locked(_))
    }
}

/// One child of a staging folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    /// Path relative to the tree root
    pub path: String,
    /// Locator the content is fetched from
    pub locator: String,
    pub is_folder: bool,
}

#[async_trait]
pub trait ContentBackend: Clone + Send + Sync + 'static {
    /// Download staged content.
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, ContentError>;

    /// Upload content to `path` in the production tree, replacing it.
    async fn upload(&self, path: &str, content: &[u8]) -> Result<(), ContentError>;

    /// Create a production folder (and its parents); existing folders are fine.
    async fn create_folder(&self, path: &str) -> Result<(), ContentError>;

    /// Children of a staging folder.
    async fn list_children(&self, folder: &str) -> Result<Vec<ContentEntry>, ContentError>;

    /// Children of a production folder.
    async fn list_production(&self, folder: &str) -> Result<Vec<ContentEntry>, ContentError>;

    /// Copy the production document at `path` to the same path in the
    /// staging tree, creating parent folders and replacing any staged copy.
    async fn copy_to_staging(&self, path: &str) -> Result<(), ContentError>;

    /// Delete a staged file, or a staged folder with everything under it.
    async fn delete_staged(&self, path: &str) -> Result<(), ContentError>;
}

/// Resolve a `/`-rooted tree path under `root`, refusing to escape it.
fn resolve(root: &Path, path: &str) -> Result<PathBuf, ContentError> {
    let rel = Path::new(path.trim_start_matches('/'));
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(ContentError::InvalidPath(path.to_string()));
    }
    Ok(root.join(rel))
}

fn not_found_or_io(path: &str, e: std::io::Error) -> ContentError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ContentError::NotFound(path.to_string())
    } else {
        ContentError::Io(e)
    }
}

/// Like [`not_found_or_io`], for writes: a refused write means locked.
fn write_error(path: &str, e: std::io::Error) -> ContentError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        ContentError::Locked(path.to_string())
    } else {
        not_found_or_io(path, e)
    }
}

/// Write `content` to `dest`, reporting a read-only destination as locked.
async fn write_unlocked(dest: &Path, path: &str, content: &[u8]) -> Result<(), ContentError> {
    if let Ok(meta) = tokio::fs::metadata(dest).await {
        if meta.permissions().readonly() {
            return Err(ContentError::Locked(path.to_string()));
        }
    }
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, content).await.map_err(|e| write_error(path, e))
}

/// Children of `folder` under `root`, hidden entries skipped, sorted by path.
async fn list_dir(root: &Path, folder: &str) -> Result<Vec<ContentEntry>, ContentError> {
    let dir = resolve(root, folder)?;
    let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| not_found_or_io(folder, e))?;
    let base = folder.trim_end_matches('/');
    let mut children = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = format!("{base}/{name}");
        children.push(ContentEntry {
            locator: path.clone(),
            path,
            is_folder: entry.file_type().await?.is_dir(),
        });
    }
    children.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(children)
}

/// Staging and production trees as local directories.
///
/// A read-only destination file reports [`ContentError::Locked`].
#[derive(Clone, Debug)]
pub struct FsContentBackend {
    staging_root: PathBuf,
    production_root: PathBuf,
}

impl FsContentBackend {
    pub fn new(staging_root: impl Into<PathBuf>, production_root: impl Into<PathBuf>) -> Self {
        Self { staging_root: staging_root.into(), production_root: production_root.into() }
    }
}

#[async_trait]
impl ContentBackend for FsContentBackend {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, ContentError> {
        let path = resolve(&self.staging_root, locator)?;
        tokio::fs::read(&path).await.map_err(|e| not_found_or_io(locator, e))
    }

    async fn upload(&self, path: &str, content: &[u8]) -> Result<(), ContentError> {
        let dest = resolve(&self.production_root, path)?;
        write_unlocked(&dest, path, content).await
    }

    async fn create_folder(&self, path: &str) -> Result<(), ContentError> {
        let dir = resolve(&self.production_root, path)?;
        tokio::fs::create_dir_all(&dir).await?;
        Ok(())
    }

    async fn list_children(&self, folder: &str) -> Result<Vec<ContentEntry>, ContentError> {
        list_dir(&self.staging_root, folder).await
    }

    async fn list_production(&self, folder: &str) -> Result<Vec<ContentEntry>, ContentError> {
        list_dir(&self.production_root, folder).await
    }

    async fn copy_to_staging(&self, path: &str) -> Result<(), ContentError> {
        let src = resolve(&self.production_root, path)?;
        let content = tokio::fs::read(&src).await.map_err(|e| not_found_or_io(path, e))?;
        let dest = resolve(&self.staging_root, path)?;
        write_unlocked(&dest, path, &content).await
    }

    async fn delete_staged(&self, path: &str) -> Result<(), ContentError> {
        if path.trim_matches('/').is_empty() {
            return Err(ContentError::InvalidPath(path.to_string()));
        }
        let target = resolve(&self.staging_root, path)?;
        let meta = tokio::fs::metadata(&target).await.map_err(|e| not_found_or_io(path, e))?;
        let removed = if meta.is_dir() {
            tokio::fs::remove_dir_all(&target).await
        } else if meta.permissions().readonly() {
            return Err(ContentError::Locked(path.to_string()));
        } else {
            tokio::fs::remove_file(&target).await
        };
        removed.map_err(|e| write_error(path, e))
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ContentBackend, ContentEntry, ContentError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, BTreeSet, HashMap};
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeContentState {
        staged: BTreeMap<String, Vec<u8>>,
        uploaded: BTreeMap<String, Vec<u8>>,
        folders: Vec<String>,
        locked: BTreeSet<String>,
        /// Remaining forced failures per path (fetch locator or upload path)
        failures: HashMap<String, u32>,
        broken_folders: BTreeSet<String>,
        fetches: usize,
    }

    /// In-memory staging and production trees.
    ///
    /// Staged locators are the staged paths themselves.
    #[derive(Clone, Default)]
    pub struct FakeContentBackend {
        inner: Arc<Mutex<FakeContentState>>,
    }

    impl FakeContentBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn stage(&self, path: &str, content: &[u8]) {
            self.inner.lock().staged.insert(path.to_string(), content.to_vec());
        }

        /// Seed the production tree.
        pub fn publish(&self, path: &str, content: &[u8]) {
            self.inner.lock().uploaded.insert(path.to_string(), content.to_vec());
        }

        /// Writes and deletes of `path` in either tree report a lock.
        pub fn lock(&self, path: &str) {
            self.inner.lock().locked.insert(path.to_string());
        }

        /// The next `times` calls touching `path` fail with a request error.
        pub fn fail(&self, path: &str, times: u32) {
            self.inner.lock().failures.insert(path.to_string(), times);
        }

        /// Listing `folder` fails.
        pub fn break_folder(&self, folder: &str) {
            self.inner.lock().broken_folders.insert(folder.to_string());
        }

        pub fn uploaded(&self, path: &str) -> Option<Vec<u8>> {
            self.inner.lock().uploaded.get(path).cloned()
        }

        pub fn uploaded_paths(&self) -> Vec<String> {
            self.inner.lock().uploaded.keys().cloned().collect()
        }

        pub fn staged(&self, path: &str) -> Option<Vec<u8>> {
            self.inner.lock().staged.get(path).cloned()
        }

        pub fn staged_paths(&self) -> Vec<String> {
            self.inner.lock().staged.keys().cloned().collect()
        }

        pub fn folders(&self) -> Vec<String> {
            self.inner.lock().folders.clone()
        }

        pub fn fetch_count(&self) -> usize {
            self.inner.lock().fetches
        }
    }

    fn take_failure(state: &mut FakeContentState, path: &str) -> bool {
        match state.failures.get_mut(path) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    fn under(path: &str, folder: &str) -> bool {
        let base = folder.trim_end_matches('/');
        path.strip_prefix(base).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    fn children(tree: &BTreeMap<String, Vec<u8>>, folder: &str) -> Vec<ContentEntry> {
        let base = folder.trim_end_matches('/');
        let mut children = BTreeMap::new();
        for path in tree.keys() {
            let Some(rest) = path.strip_prefix(base).and_then(|r| r.strip_prefix('/')) else {
                continue;
            };
            let (name, is_folder) = match rest.split_once('/') {
                Some((dir, _)) => (dir, true),
                None => (rest, false),
            };
            let child = format!("{base}/{name}");
            children.entry(child.clone()).or_insert(ContentEntry {
                locator: child.clone(),
                path: child,
                is_folder,
            });
        }
        children.into_values().collect()
    }

    #[async_trait]
    impl ContentBackend for FakeContentBackend {
        async fn fetch(&self, locator: &str) -> Result<Vec<u8>, ContentError> {
            let mut inner = self.inner.lock();
            inner.fetches += 1;
            if take_failure(&mut inner, locator) {
                return Err(ContentError::Request(format!("fetch failed: {locator}")));
            }
            inner
                .staged
                .get(locator)
                .cloned()
                .ok_or_else(|| ContentError::NotFound(locator.to_string()))
        }

        async fn upload(&self, path: &str, content: &[u8]) -> Result<(), ContentError> {
            let mut inner = self.inner.lock();
            if inner.locked.contains(path) {
                return Err(ContentError::Locked(path.to_string()));
            }
            if take_failure(&mut inner, path) {
                return Err(ContentError::Request(format!("upload failed: {path}")));
            }
            inner.uploaded.insert(path.to_string(), content.to_vec());
            Ok(())
        }

        async fn create_folder(&self, path: &str) -> Result<(), ContentError> {
            self.inner.lock().folders.push(path.to_string());
            Ok(())
        }

        async fn list_children(&self, folder: &str) -> Result<Vec<ContentEntry>, ContentError> {
            let inner = self.inner.lock();
            if inner.broken_folders.contains(folder) {
                return Err(ContentError::Request(format!("list failed: {folder}")));
            }
            Ok(children(&inner.staged, folder))
        }

        async fn list_production(&self, folder: &str) -> Result<Vec<ContentEntry>, ContentError> {
            let inner = self.inner.lock();
            if inner.broken_folders.contains(folder) {
                return Err(ContentError::Request(format!("list failed: {folder}")));
            }
            Ok(children(&inner.uploaded, folder))
        }

        async fn copy_to_staging(&self, path: &str) -> Result<(), ContentError> {
            let mut inner = self.inner.lock();
            if inner.locked.contains(path) {
                return Err(ContentError::Locked(path.to_string()));
            }
            if take_failure(&mut inner, path) {
                return Err(ContentError::Request(format!("copy failed: {path}")));
            }
            let content = inner
                .uploaded
                .get(path)
                .cloned()
                .ok_or_else(|| ContentError::NotFound(path.to_string()))?;
            inner.staged.insert(path.to_string(), content);
            Ok(())
        }

        async fn delete_staged(&self, path: &str) -> Result<(), ContentError> {
            if path.trim_matches('/').is_empty() {
                return Err(ContentError::InvalidPath(path.to_string()));
            }
            let mut inner = self.inner.lock();
            if inner.locked.contains(path) {
                return Err(ContentError::Locked(path.to_string()));
            }
            if take_failure(&mut inner, path) {
                return Err(ContentError::Request(format!("delete failed: {path}")));
            }
            let before = inner.staged.len();
            inner.staged.retain(|staged, _| !under(staged, path));
            if inner.staged.len() == before {
                return Err(ContentError::NotFound(path.to_string()));
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeContentBackend;

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
