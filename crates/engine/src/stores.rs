// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fg_core::{Clock, PromoteConfig};
use fg_storage::{BlobStore, KvStore, StatusStore};
use std::sync::Arc;

/// The state and file stores of a promote job, plus its clock.
#[derive(Clone)]
pub struct Stores<C: Clock> {
    pub blobs: Arc<dyn BlobStore>,
    pub statuses: StatusStore<C>,
    pub clock: C,
}

impl<C: Clock> Stores<C> {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        kv: Arc<dyn KvStore>,
        config: &PromoteConfig,
        clock: C,
    ) -> Self {
        let statuses = StatusStore::new(kv, config.status_ttl(), clock.clone());
        Self { blobs, statuses, clock }
    }

    pub fn now(&self) -> u64 {
        self.clock.epoch_ms()
    }
}
