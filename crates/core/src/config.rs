// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Promote configuration and per-job parameters.
//!
//! [`PromoteConfig`] holds tunables with defaults enumerated once in its
//! `Default` impl. It is built per job invocation and handed to each
//! component's constructor. [`JobParams`] holds what the caller must supply.

use crate::error::PromoteError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for planning, tracking and executing a promote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromoteConfig {
    /// Items per batch (one worker invocation each)
    pub max_items_per_batch: usize,
    /// Items copied concurrently within one group
    pub copy_concurrency: usize,
    /// Pause between copy groups, to respect backend rate limits
    pub group_delay_ms: u64,
    /// Attempts per backend or distribution call before recording a failure
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Expiration of status records
    pub status_ttl_secs: u64,
    /// Name the worker is launched under
    pub worker_action: String,
    pub preview_enabled: bool,
    /// Staging folders walked when discovering items
    pub discovery_folders: Vec<String>,
    /// How long a claimed batch may wait for its activation handle
    pub claim_timeout_ms: u64,
    /// Report table receiving the final row
    pub report_table: String,
    /// Report table receiving the row of a floodgate copy
    pub copy_report_table: String,
    /// Start a copy or delete even while an earlier run looks alive
    pub skip_in_progress_check: bool,
}

impl Default for PromoteConfig {
    fn default() -> Self {
        Self {
            max_items_per_batch: 10_000,
            copy_concurrency: 20,
            group_delay_ms: 3_000,
            max_retries: 5,
            retry_delay_ms: 100,
            status_ttl_secs: 30 * 24 * 60 * 60,
            worker_action: "promote-worker".to_string(),
            preview_enabled: true,
            discovery_folders: vec!["/drafts".to_string()],
            claim_timeout_ms: 10 * 60 * 1000,
            report_table: "PROMOTE_STATUS".to_string(),
            copy_report_table: "COPY_STATUS".to_string(),
            skip_in_progress_check: false,
        }
    }
}

impl PromoteConfig {
    crate::setters! {
        into {
            worker_action: String,
            report_table: String,
            copy_report_table: String,
        }
        set {
            max_items_per_batch: usize,
            copy_concurrency: usize,
            group_delay_ms: u64,
            max_retries: u32,
            retry_delay_ms: u64,
            status_ttl_secs: u64,
            preview_enabled: bool,
            discovery_folders: Vec<String>,
            claim_timeout_ms: u64,
            skip_in_progress_check: bool,
        }
    }

    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PromoteConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items_per_batch == 0 {
            return Err(ConfigError::Invalid("max_items_per_batch must be at least 1".into()));
        }
        if self.copy_concurrency == 0 {
            return Err(ConfigError::Invalid("copy_concurrency must be at least 1".into()));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be at least 1".into()));
        }
        Ok(())
    }

    pub fn group_delay(&self) -> Duration {
        Duration::from_millis(self.group_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }
}

/// Site coordinates the distribution network addresses documents by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRef {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

/// Parameters the caller supplies for one promote job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParams {
    /// Staging tree root; doubles as the job key
    pub fg_root_folder: String,
    /// Admin page the job was started from; carries `owner`, `repo`, `ref`
    pub admin_page_uri: String,
    /// Project document receiving the report row
    pub project_excel_path: String,
    #[serde(default)]
    pub do_publish: bool,
}

impl JobParams {
    /// Check the required parameters, naming every missing one.
    pub fn validate(&self) -> Result<(), PromoteError> {
        let missing: Vec<&str> = [
            ("fg_root_folder", &self.fg_root_folder),
            ("admin_page_uri", &self.admin_page_uri),
            ("project_excel_path", &self.project_excel_path),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(PromoteError::Validation(format!(
                "missing required parameters: {}",
                missing.join(", ")
            )));
        }
        if self.site().is_none() {
            return Err(PromoteError::Validation(format!(
                "admin_page_uri must carry owner, repo and ref: {}",
                self.admin_page_uri
            )));
        }
        Ok(())
    }

    /// Site coordinates from the admin page query string.
    pub fn site(&self) -> Option<SiteRef> {
        let (_, query) = self.admin_page_uri.split_once('?')?;
        let query = query.split('#').next().unwrap_or_default();
        let mut owner = None;
        let mut repo = None;
        let mut branch = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("owner", v)) if !v.is_empty() => owner = Some(v.to_string()),
                Some(("repo", v)) if !v.is_empty() => repo = Some(v.to_string()),
                Some(("ref", v)) if !v.is_empty() => branch = Some(v.to_string()),
                _ => {}
            }
        }
        Some(SiteRef { owner: owner?, repo: repo?, branch: branch? })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
