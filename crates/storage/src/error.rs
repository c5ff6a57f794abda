// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from the key-value store
#[derive(Debug, Error)]
pub enum KvError {
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the blob store
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// A conditional write saw a different revision than expected
    #[error("concurrent modification of {0}")]
    Conflict(String),
    #[error("unreadable revision file: {0}")]
    CorruptRevision(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
