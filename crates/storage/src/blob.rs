// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blob store for descriptors, item lists and results.
//!
//! Paths are relative, `/`-separated and never contain `.` or `..`
//! segments. Every write stamps the path with a fresh [`Revision`], which
//! backs the conditional write used to claim batches.

use crate::error::BlobError;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Store-wide write counter. Revisions are never reused, including after
/// a path is deleted and written again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Revision(pub u64);

impl Revision {
    fn after(last: u64, current: Option<Revision>) -> Revision {
        Revision(last.max(current.map_or(0, |r| r.0)) + 1)
    }
}

pub trait BlobStore: Send + Sync + 'static {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, BlobError>;

    fn read_versioned(&self, path: &str) -> Result<Option<(Vec<u8>, Revision)>, BlobError>;

    fn write(&self, path: &str, data: &[u8]) -> Result<Revision, BlobError>;

    /// Write only if the current revision is `expected` (`None`: the path
    /// must not exist yet). Otherwise fails with [`BlobError::Conflict`].
    fn write_if(
        &self,
        path: &str,
        data: &[u8],
        expected: Option<Revision>,
    ) -> Result<Revision, BlobError>;

    /// Files under `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError>;

    /// Remove a file or everything under a prefix. Returns the number of
    /// files removed.
    fn delete(&self, path: &str) -> Result<usize, BlobError>;
}

/// JSON helpers over any [`BlobStore`].
pub trait BlobStoreExt: BlobStore {
    fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, BlobError> {
        match self.read(path)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn read_json_versioned<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<(T, Revision)>, BlobError> {
        match self.read_versioned(path)? {
            Some((bytes, rev)) => Ok(Some((serde_json::from_slice(&bytes)?, rev))),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize>(&self, path: &str, value: &T) -> Result<Revision, BlobError> {
        self.write(path, &serde_json::to_vec_pretty(value)?)
    }

    fn write_json_if<T: Serialize>(
        &self,
        path: &str,
        value: &T,
        expected: Option<Revision>,
    ) -> Result<Revision, BlobError> {
        self.write_if(path, &serde_json::to_vec_pretty(value)?, expected)
    }
}

impl<S: BlobStore + ?Sized> BlobStoreExt for S {}

fn check_path(path: &str) -> Result<(), BlobError> {
    let trimmed = path.trim_end_matches('/');
    let valid = !trimmed.starts_with('/')
        && !trimmed.contains('\\')
        && (trimmed.is_empty()
            || trimmed.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != ".."));
    if valid {
        Ok(())
    } else {
        Err(BlobError::InvalidPath(path.to_string()))
    }
}

/// Files under a root directory.
///
/// Revisions live under `<root>/.rev/` and the last issued one in
/// `<root>/.seq`; writes are serialized by an exclusive lock on
/// `<root>/.lock` and land through a temp file renamed into place.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_end_matches('/'))
    }

    fn rev_path(&self, path: &str) -> PathBuf {
        self.root.join(".rev").join(format!("{}.rev", path.trim_end_matches('/')))
    }

    fn lock(&self) -> Result<File, BlobError> {
        fs::create_dir_all(&self.root)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.root.join(".lock"))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read_counter(file: &Path) -> Result<Option<u64>, BlobError> {
        match fs::read_to_string(file) {
            Ok(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| BlobError::CorruptRevision(file.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn current_revision(&self, path: &str) -> Result<Option<Revision>, BlobError> {
        if !self.file_path(path).is_file() {
            return Ok(None);
        }
        let rev = Self::read_counter(&self.rev_path(path))?.unwrap_or(0);
        Ok(Some(Revision(rev)))
    }

    fn last_issued(&self) -> Result<u64, BlobError> {
        Ok(Self::read_counter(&self.root.join(".seq"))?.unwrap_or(0))
    }

    fn write_locked(
        &self,
        path: &str,
        data: &[u8],
        current: Option<Revision>,
    ) -> Result<Revision, BlobError> {
        let file = self.file_path(path);
        let rev_file = self.rev_path(path);
        for dir in [file.parent(), rev_file.parent()].into_iter().flatten() {
            fs::create_dir_all(dir)?;
        }
        let tmp = file.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &file)?;

        let next = Revision::after(self.last_issued()?, current);
        fs::write(self.root.join(".seq"), next.0.to_string())?;
        fs::write(&rev_file, next.0.to_string())?;
        Ok(next)
    }
}

impl BlobStore for FsBlobStore {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, BlobError> {
        check_path(path)?;
        match fs::read(self.file_path(path)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_versioned(&self, path: &str) -> Result<Option<(Vec<u8>, Revision)>, BlobError> {
        check_path(path)?;
        let _lock = self.lock()?;
        let Some(rev) = self.current_revision(path)? else {
            return Ok(None);
        };
        Ok(Some((fs::read(self.file_path(path))?, rev)))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<Revision, BlobError> {
        check_path(path)?;
        let _lock = self.lock()?;
        let current = self.current_revision(path)?;
        self.write_locked(path, data, current)
    }

    fn write_if(
        &self,
        path: &str,
        data: &[u8],
        expected: Option<Revision>,
    ) -> Result<Revision, BlobError> {
        check_path(path)?;
        let _lock = self.lock()?;
        let current = self.current_revision(path)?;
        if current != expected {
            return Err(BlobError::Conflict(path.to_string()));
        }
        self.write_locked(path, data, current)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError> {
        check_path(prefix)?;
        let base = self.file_path(prefix);
        let mut files = Vec::new();
        if base.is_file() {
            files.push(prefix.trim_end_matches('/').to_string());
            return Ok(files);
        }
        let mut pending = vec![base];
        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                let entry = entry?;
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with('.') || name.ends_with(".tmp") {
                    continue;
                }
                let path = entry.path();
                if entry.file_type()?.is_dir() {
                    pending.push(path);
                } else if let Ok(rel) = path.strip_prefix(&self.root) {
                    files.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        files.sort();
        Ok(files)
    }

    fn delete(&self, path: &str) -> Result<usize, BlobError> {
        check_path(path)?;
        if path.trim_end_matches('/').is_empty() {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        let _lock = self.lock()?;
        let removed = self.list(path)?.len();
        let target = self.file_path(path);
        let rev_target = self.root.join(".rev").join(path.trim_end_matches('/'));
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
            if rev_target.is_dir() {
                fs::remove_dir_all(&rev_target)?;
            }
        } else if target.is_file() {
            fs::remove_file(&target)?;
            if let Err(e) = fs::remove_file(self.rev_path(path)) {
                tracing::debug!(path, error = %e, "no revision to remove");
            }
        }
        Ok(removed)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod memory {
    use super::{check_path, BlobStore, Revision};
    use crate::error::BlobError;
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Arc;

    #[derive(Default)]
    struct MemoryBlobState {
        files: BTreeMap<String, (Vec<u8>, Revision)>,
        last_issued: u64,
        failing: bool,
        conflicts: HashSet<String>,
    }

    /// In-memory store for tests. Clones share files.
    #[derive(Clone, Default)]
    pub struct MemoryBlobStore {
        inner: Arc<Mutex<MemoryBlobState>>,
    }

    fn under(file: &str, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('/');
        prefix.is_empty()
            || file == prefix
            || file.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
    }

    impl MemoryBlobStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent call fail with an IO error.
        pub fn set_failing(&self, failing: bool) {
            self.inner.lock().failing = failing;
        }

        /// Make the next conditional write to `path` lose, as if another
        /// writer had got there first.
        pub fn conflict_next_write_if(&self, path: &str) {
            self.inner.lock().conflicts.insert(path.to_string());
        }

        pub fn contains(&self, path: &str) -> bool {
            self.inner.lock().files.contains_key(path)
        }

        /// Overwrite a file without bumping its revision (for corrupt-file tests).
        pub fn put_raw(&self, path: &str, data: &[u8]) {
            let mut inner = self.inner.lock();
            let rev = match inner.files.get(path) {
                Some((_, r)) => *r,
                None => {
                    inner.last_issued += 1;
                    Revision(inner.last_issued)
                }
            };
            inner.files.insert(path.to_string(), (data.to_vec(), rev));
        }
    }

    fn unavailable() -> BlobError {
        BlobError::Io(std::io::Error::other("store unavailable"))
    }

    impl BlobStore for MemoryBlobStore {
        fn read(&self, path: &str) -> Result<Option<Vec<u8>>, BlobError> {
            Ok(self.read_versioned(path)?.map(|(bytes, _)| bytes))
        }

        fn read_versioned(&self, path: &str) -> Result<Option<(Vec<u8>, Revision)>, BlobError> {
            check_path(path)?;
            let inner = self.inner.lock();
            if inner.failing {
                return Err(unavailable());
            }
            Ok(inner.files.get(path).cloned())
        }

        fn write(&self, path: &str, data: &[u8]) -> Result<Revision, BlobError> {
            check_path(path)?;
            let mut inner = self.inner.lock();
            if inner.failing {
                return Err(unavailable());
            }
            let next = Revision::after(inner.last_issued, inner.files.get(path).map(|(_, r)| *r));
            inner.last_issued = next.0;
            inner.files.insert(path.to_string(), (data.to_vec(), next));
            Ok(next)
        }

        fn write_if(
            &self,
            path: &str,
            data: &[u8],
            expected: Option<Revision>,
        ) -> Result<Revision, BlobError> {
            check_path(path)?;
            let mut inner = self.inner.lock();
            if inner.failing {
                return Err(unavailable());
            }
            let current = inner.files.get(path).map(|(_, r)| *r);
            if inner.conflicts.remove(path) || current != expected {
                return Err(BlobError::Conflict(path.to_string()));
            }
            let next = Revision::after(inner.last_issued, current);
            inner.last_issued = next.0;
            inner.files.insert(path.to_string(), (data.to_vec(), next));
            Ok(next)
        }

        fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError> {
            check_path(prefix)?;
            let inner = self.inner.lock();
            if inner.failing {
                return Err(unavailable());
            }
            Ok(inner.files.keys().filter(|f| under(f, prefix)).cloned().collect())
        }

        fn delete(&self, path: &str) -> Result<usize, BlobError> {
            check_path(path)?;
            if path.trim_end_matches('/').is_empty() {
                return Err(BlobError::InvalidPath(path.to_string()));
            }
            let mut inner = self.inner.lock();
            if inner.failing {
                return Err(unavailable());
            }
            let before = inner.files.len();
            inner.files.retain(|f, _| !under(f, path));
            Ok(before - inner.files.len())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryBlobStore;

#[cfg(test)]
#[path = "blob_tests.rs"]
mod tests;
