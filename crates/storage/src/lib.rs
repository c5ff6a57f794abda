// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fg-storage: Persistence for promote jobs
//!
//! Two external stores back a promote job: a key-value store holding
//! [`JobStatus`](fg_core::JobStatus) records with an expiration, and a blob
//! store holding the instance descriptor, batch item lists and results.

mod blob;
mod error;
mod kv;
pub mod layout;
mod status_store;

pub use blob::{BlobStore, BlobStoreExt, FsBlobStore, Revision};
pub use error::{BlobError, KvError};
pub use kv::{FsKvStore, KvStore};
pub use status_store::StatusStore;

#[cfg(any(test, feature = "test-support"))]
pub use blob::MemoryBlobStore;
#[cfg(any(test, feature = "test-support"))]
pub use kv::MemoryKvStore;
