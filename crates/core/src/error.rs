// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-level error taxonomy.

use thiserror::Error;

/// Errors that change a job's status.
///
/// Per-item failures are not errors at this level: they are collected into
/// batch results and only show up in the final report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoteError {
    /// Missing or malformed job parameters; never retried
    #[error("validation failed: {0}")]
    Validation(String),
    /// State or file store I/O failed
    #[error("storage error: {0}")]
    Storage(String),
    /// Content backend or distribution call failed after retries
    #[error("network error: {0}")]
    Network(String),
    /// Another run of the same job is still going
    #[error("already in progress: {0}")]
    InProgress(String),
    /// A worker could not be launched
    #[error("failed to invoke worker for batch {batch}: {message}")]
    Invocation { batch: u32, message: String },
}

impl PromoteError {
    pub fn storage(e: impl std::fmt::Display) -> Self {
        PromoteError::Storage(e.to_string())
    }
}
