// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for engine tests: every collaborator faked, one clock.

use crate::aggregator::ResultAggregator;
use crate::manager::BatchManager;
use crate::reconciler::Reconciler;
use crate::stores::Stores;
use crate::tree::{TreeJob, TreeWorker};
use crate::worker::PromoteWorker;
use fg_adapters::{FakeContentBackend, FakeDistribution, FakeLauncher, FakeReportSink};
use fg_core::test_support::{test_params, TEST_ROOT};
use fg_core::{
    BatchState, FakeClock, InstanceDescriptor, Item, JobKey, JobParams, JobState, JobStatus,
    PromoteConfig, StatusPatch,
};
use fg_storage::{MemoryBlobStore, MemoryKvStore};
use std::sync::Arc;

pub(crate) struct Harness {
    pub key: JobKey,
    pub config: PromoteConfig,
    pub clock: FakeClock,
    pub blobs: Arc<MemoryBlobStore>,
    pub kv: Arc<MemoryKvStore<FakeClock>>,
    pub stores: Stores<FakeClock>,
    pub launcher: FakeLauncher,
    pub content: FakeContentBackend,
    pub distribution: FakeDistribution,
    pub report: FakeReportSink,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(
            PromoteConfig::default().max_items_per_batch(20).group_delay_ms(0).retry_delay_ms(0),
        )
    }

    pub fn with_config(config: PromoteConfig) -> Self {
        let clock = FakeClock::new();
        let blobs = Arc::new(MemoryBlobStore::new());
        let kv = Arc::new(MemoryKvStore::new(clock.clone()));
        let stores = Stores::new(blobs.clone(), kv.clone(), &config, clock.clone());
        Self {
            key: JobKey::new(TEST_ROOT),
            config,
            clock,
            blobs,
            kv,
            stores,
            launcher: FakeLauncher::new(),
            content: FakeContentBackend::new(),
            distribution: FakeDistribution::new(),
            report: FakeReportSink::new(),
        }
    }

    pub fn params(&self) -> JobParams {
        test_params()
    }

    pub fn manager(&self) -> BatchManager<FakeLauncher, FakeClock> {
        BatchManager::new(
            self.key.clone(),
            self.stores.clone(),
            self.launcher.clone(),
            self.config.clone(),
        )
    }

    pub fn reconciler(&self) -> Reconciler<FakeLauncher, FakeReportSink, FakeClock> {
        Reconciler::new(self.manager(), self.aggregator(), self.config.clone())
    }

    pub fn aggregator(&self) -> ResultAggregator<FakeReportSink> {
        ResultAggregator::new(self.report.clone(), self.config.clone())
    }

    pub fn worker(&self) -> PromoteWorker<FakeContentBackend, FakeDistribution, FakeClock> {
        PromoteWorker::new(
            self.key.clone(),
            self.stores.clone(),
            self.content.clone(),
            self.distribution.clone(),
            self.config.clone(),
        )
    }

    pub fn tree_worker(
        &self,
        job: TreeJob,
    ) -> TreeWorker<FakeContentBackend, FakeReportSink, FakeClock> {
        TreeWorker::new(
            job,
            job.key(&self.params()),
            self.stores.clone(),
            self.content.clone(),
            self.report.clone(),
            self.config.clone(),
        )
    }

    /// Stage `items` in the fake backend under their source locators.
    pub fn stage(&self, items: &[Item]) {
        for item in items {
            self.content.stage(&item.source, item.path.as_bytes());
        }
    }

    /// Plan `items` and trigger batch 1.
    pub async fn plan(&self, items: &[Item]) -> InstanceDescriptor {
        let mut manager = self.manager();
        manager.init(self.params()).unwrap();
        for item in items {
            manager.add_item(item.clone()).unwrap();
        }
        manager.finalize_instance().await.unwrap()
    }

    pub fn descriptor(&self) -> InstanceDescriptor {
        self.manager().get_instance_data().unwrap().unwrap().0
    }

    pub fn batch_state(&self, batch_number: u32) -> BatchState {
        self.descriptor().batch(batch_number).map(|b| b.state).unwrap()
    }

    pub fn job_status(&self) -> JobStatus {
        self.stores.statuses.read(&self.key).unwrap_or_default()
    }

    pub fn batch_status(&self, batch_number: u32) -> Option<JobStatus> {
        self.stores.statuses.read(&self.key.batch(batch_number))
    }

    /// Write a batch status record the way a worker would.
    pub fn set_batch_status(&self, batch_number: u32, patch: StatusPatch) {
        self.stores.statuses.update(&self.key.batch(batch_number), &patch);
    }

    /// Run the worker for `batch_number` and mark its activation finished.
    pub async fn run_worker(&self, batch_number: u32) -> JobState {
        let state = self.worker().run(batch_number, &self.params()).await.unwrap();
        if let Some(id) = self.descriptor().batch(batch_number).and_then(|b| b.activation_id.clone()) {
            self.launcher.finish(&id);
        }
        state
    }
}
