// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value store with per-entry expiration.

use crate::error::KvError;
use fg_core::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Key-value store used for status records.
///
/// Keys are digests; values are JSON. An entry past its expiration reads as
/// absent.
pub trait KvStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<Value>, KvError>;
    fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), KvError>;
    fn delete(&self, key: &str) -> Result<(), KvError>;
}

fn check_key(key: &str) -> Result<(), KvError> {
    let valid = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(KvError::InvalidKey(key.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    value: Value,
    expires_at_ms: u64,
}

/// One JSON file per key under a directory.
pub struct FsKvStore<C: Clock = SystemClock> {
    dir: PathBuf,
    clock: C,
}

impl FsKvStore<SystemClock> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, SystemClock)
    }
}

impl<C: Clock> FsKvStore<C> {
    pub fn with_clock(dir: impl Into<PathBuf>, clock: C) -> Self {
        Self { dir: dir.into(), clock }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl<C: Clock> KvStore for FsKvStore<C> {
    fn get(&self, key: &str) -> Result<Option<Value>, KvError> {
        check_key(key)?;
        let path = self.entry_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: Entry = serde_json::from_slice(&bytes)?;
        if entry.expires_at_ms <= self.clock.epoch_ms() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::debug!(key, error = %e, "failed to remove expired entry");
            }
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), KvError> {
        check_key(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let entry = Entry {
            value: value.clone(),
            expires_at_ms: self.clock.epoch_ms().saturating_add(ttl.as_millis() as u64),
        };
        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_vec(&entry)?)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        check_key(key)?;
        match std::fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod memory {
    use super::{check_key, KvStore};
    use crate::error::KvError;
    use fg_core::{Clock, FakeClock};
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct MemoryKvState {
        entries: HashMap<String, (Value, u64)>,
        puts: usize,
    }

    /// In-memory store for tests. Clones share entries.
    #[derive(Clone)]
    pub struct MemoryKvStore<C: Clock = FakeClock> {
        inner: Arc<Mutex<MemoryKvState>>,
        failing: Arc<AtomicBool>,
        clock: C,
    }

    impl Default for MemoryKvStore<FakeClock> {
        fn default() -> Self {
            Self::new(FakeClock::new())
        }
    }

    impl<C: Clock> MemoryKvStore<C> {
        pub fn new(clock: C) -> Self {
            Self {
                inner: Arc::new(Mutex::new(MemoryKvState { entries: HashMap::new(), puts: 0 })),
                failing: Arc::new(AtomicBool::new(false)),
                clock,
            }
        }

        /// Make every subsequent call fail with an IO error.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Number of successful puts
        pub fn puts(&self) -> usize {
            self.inner.lock().puts
        }

        pub fn len(&self) -> usize {
            self.inner.lock().entries.len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn check(&self) -> Result<(), KvError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(KvError::Io(std::io::Error::other("store unavailable")));
            }
            Ok(())
        }
    }

    impl<C: Clock> KvStore for MemoryKvStore<C> {
        fn get(&self, key: &str) -> Result<Option<Value>, KvError> {
            self.check()?;
            check_key(key)?;
            let now = self.clock.epoch_ms();
            let mut inner = self.inner.lock();
            match inner.entries.get(key) {
                Some((_, expires)) if *expires <= now => {
                    inner.entries.remove(key);
                    Ok(None)
                }
                Some((value, _)) => Ok(Some(value.clone())),
                None => Ok(None),
            }
        }

        fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), KvError> {
            self.check()?;
            check_key(key)?;
            let expires = self.clock.epoch_ms().saturating_add(ttl.as_millis() as u64);
            let mut inner = self.inner.lock();
            inner.entries.insert(key.to_string(), (value.clone(), expires));
            inner.puts += 1;
            Ok(())
        }

        fn delete(&self, key: &str) -> Result<(), KvError> {
            self.check()?;
            self.inner.lock().entries.remove(key);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryKvStore;

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
