// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JobStatus records over a [`KvStore`].

use crate::error::KvError;
use crate::kv::KvStore;
use fg_core::{Clock, JobKey, JobStatus, StatusPatch, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Reads and merge-updates status records keyed by job-key digest.
///
/// Updates never fail: storage errors are logged and the merged record is
/// returned from memory.
#[derive(Clone)]
pub struct StatusStore<C: Clock = SystemClock> {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
    clock: C,
}

impl<C: Clock> StatusStore<C> {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration, clock: C) -> Self {
        Self { kv, ttl, clock }
    }

    /// Merge `patch` into the stored record and write it back.
    pub fn update(&self, key: &JobKey, patch: &StatusPatch) -> JobStatus {
        let digest = key.digest();
        let mut record = match self.try_read(key) {
            Ok(record) => record.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(job_key = %key, error = %e, "status read failed, merging into empty record");
                JobStatus::default()
            }
        };

        if !record.merge(patch, self.clock.epoch_ms()) {
            tracing::warn!(
                job_key = %key,
                from = ?record.status,
                to = ?patch.status,
                "ignoring status transition out of terminal state"
            );
        }

        let written = serde_json::to_value(&record)
            .map_err(KvError::from)
            .and_then(|value| self.kv.put(&digest, &value, self.ttl));
        if let Err(e) = written {
            tracing::error!(job_key = %key, error = %e, "failed to persist status");
        }
        record
    }

    /// Current record; absent, expired and unreadable records read as `None`.
    pub fn read(&self, key: &JobKey) -> Option<JobStatus> {
        match self.try_read(key) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(job_key = %key, error = %e, "status read failed");
                None
            }
        }
    }

    pub fn try_read(&self, key: &JobKey) -> Result<Option<JobStatus>, KvError> {
        match self.kv.get(&key.digest())? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Remove the record; the next update starts from scratch.
    pub fn reset(&self, key: &JobKey) -> Result<(), KvError> {
        self.kv.delete(&key.digest())
    }

    /// First-seen start time and terminal-update time of the record.
    pub fn start_end_time(&self, key: &JobKey) -> (Option<u64>, Option<u64>) {
        self.read(key).map(|r| r.start_end_time()).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "status_store_tests.rs"]
mod tests;
