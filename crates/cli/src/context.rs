// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring of the local stores and adapters behind every command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use fg_adapters::{FsContentBackend, HttpDistribution, JsonlReportSink, ProcessLauncher};
use fg_core::{JobKey, PromoteConfig, SystemClock};
use fg_engine::{
    BatchManager, PromoteWorker, Reconciler, ResultAggregator, Stores, TreeJob, TreeWorker,
};
use fg_storage::{FsBlobStore, FsKvStore};

use crate::env;

pub struct App {
    pub state_dir: PathBuf,
    pub config: PromoteConfig,
    config_path: Option<PathBuf>,
    pub stores: Stores<SystemClock>,
}

impl App {
    /// Resolve the state directory and load the config (`--config`, then
    /// `FG_CONFIG`, then defaults).
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let state_dir = env::state_dir()?;
        let config_path = config_path.map(Path::to_path_buf).or_else(env::config_path);
        let config = PromoteConfig::load(config_path.as_deref())?;
        let stores = Stores::new(
            Arc::new(FsBlobStore::new(state_dir.join("files"))),
            Arc::new(FsKvStore::new(state_dir.join("status"))),
            &config,
            SystemClock,
        );
        Ok(Self { state_dir, config, config_path, stores })
    }

    /// Launches `fgp worker` from the running executable. Workers inherit the
    /// resolved state directory and config file.
    pub fn launcher(&self) -> Result<ProcessLauncher> {
        let exe = std::env::current_exe().context("failed to locate the fgp executable")?;
        let mut launcher = ProcessLauncher::new(exe, self.state_dir.join("activations"))
            .with_env("FG_STATE_DIR", self.state_dir.display().to_string());
        if let Some(path) = &self.config_path {
            let path = std::path::absolute(path).unwrap_or_else(|_| path.clone());
            launcher = launcher.with_env("FG_CONFIG", path.display().to_string());
        }
        Ok(launcher)
    }

    pub fn content(&self) -> FsContentBackend {
        FsContentBackend::new(env::staging_root(&self.state_dir), env::production_root(&self.state_dir))
    }

    pub fn report(&self) -> JsonlReportSink {
        JsonlReportSink::new(self.state_dir.join("reports"))
    }

    pub fn manager(&self, key: &JobKey) -> Result<BatchManager<ProcessLauncher, SystemClock>> {
        Ok(BatchManager::new(key.clone(), self.stores.clone(), self.launcher()?, self.config.clone()))
    }

    pub fn reconciler(
        &self,
        key: &JobKey,
    ) -> Result<Reconciler<ProcessLauncher, JsonlReportSink, SystemClock>> {
        let aggregator = ResultAggregator::new(self.report(), self.config.clone());
        Ok(Reconciler::new(self.manager(key)?, aggregator, self.config.clone()))
    }

    pub fn worker(
        &self,
        key: &JobKey,
    ) -> PromoteWorker<FsContentBackend, HttpDistribution, SystemClock> {
        PromoteWorker::new(
            key.clone(),
            self.stores.clone(),
            self.content(),
            HttpDistribution::new(env::admin_addr()),
            self.config.clone(),
        )
    }

    pub fn tree_worker(
        &self,
        key: &JobKey,
        job: TreeJob,
    ) -> TreeWorker<FsContentBackend, JsonlReportSink, SystemClock> {
        TreeWorker::new(
            job,
            key.clone(),
            self.stores.clone(),
            self.content(),
            self.report(),
            self.config.clone(),
        )
    }
}
