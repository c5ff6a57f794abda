// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Administrative operations over the stores.

use crate::stores::Stores;
use fg_core::{Clock, JobKey, JobStatus, PromoteError};
use fg_storage::layout;
use serde_json::Value;

/// Contents of a stored file.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredData {
    Json(Value),
    /// Not valid JSON; shown as (lossy) text
    Text(String),
}

pub struct Maintenance<C: Clock> {
    stores: Stores<C>,
}

impl<C: Clock> Maintenance<C> {
    pub fn new(stores: Stores<C>) -> Self {
        Self { stores }
    }

    pub fn list(&self, prefix: &str) -> Result<Vec<String>, PromoteError> {
        self.stores.blobs.list(prefix).map_err(PromoteError::storage)
    }

    pub fn read(&self, path: &str) -> Result<Option<StoredData>, PromoteError> {
        let Some(bytes) = self.stores.blobs.read(path).map_err(PromoteError::storage)? else {
            return Ok(None);
        };
        Ok(Some(match serde_json::from_slice(&bytes) {
            Ok(value) => StoredData::Json(value),
            Err(_) => StoredData::Text(String::from_utf8_lossy(&bytes).into_owned()),
        }))
    }

    /// Delete everything under `prefix`; returns the number of files removed.
    pub fn delete(&self, prefix: &str) -> Result<usize, PromoteError> {
        let removed = self.stores.blobs.delete(prefix).map_err(PromoteError::storage)?;
        tracing::info!(prefix, removed, "deleted files");
        Ok(removed)
    }

    pub fn status(&self, key: &JobKey) -> Result<Option<JobStatus>, PromoteError> {
        self.stores.statuses.try_read(key).map_err(PromoteError::storage)
    }

    /// Clear a status record, returning what it held.
    pub fn clear_status(&self, key: &JobKey) -> Result<Option<JobStatus>, PromoteError> {
        let cleared = self.status(key)?;
        self.stores.statuses.reset(key).map_err(PromoteError::storage)?;
        tracing::info!(job_key = %key, existed = cleared.is_some(), "status cleared");
        Ok(cleared)
    }

    /// Clear the instance descriptor and every batch file of `key`.
    pub fn clear_instance(&self, key: &JobKey) -> Result<usize, PromoteError> {
        self.delete(&layout::instance_prefix(key))
    }
}

#[cfg(test)]
#[path = "maint_tests.rs"]
mod tests;
