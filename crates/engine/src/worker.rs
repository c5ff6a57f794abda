// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker side of one batch: copy, preview, publish, report.

use crate::manager::BatchFiles;
use crate::retry::RetryPolicy;
use crate::stores::Stores;
use fg_adapters::{ContentBackend, ContentError, DistributionAdapter, DistributionOp};
use fg_core::{
    BatchResult, Clock, Item, JobKey, JobParams, JobState, PromoteConfig, PromoteError, SiteRef,
    Stage, StatusPatch,
};
use futures_util::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct PromoteWorker<B, D, C: Clock> {
    key: JobKey,
    stores: Stores<C>,
    content: B,
    distribution: D,
    config: PromoteConfig,
    retry: RetryPolicy,
}

impl<B, D, C> PromoteWorker<B, D, C>
where
    B: ContentBackend,
    D: DistributionAdapter,
    C: Clock,
{
    pub fn new(
        key: JobKey,
        stores: Stores<C>,
        content: B,
        distribution: D,
        config: PromoteConfig,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self { key, stores, content, distribution, config, retry }
    }

    /// Execute batch `batch_number` and return its terminal state.
    ///
    /// Per-item failures end up in the batch result. Only an unreadable item
    /// list, unusable parameters or an unwritable result fail the batch.
    pub async fn run(&self, batch_number: u32, params: &JobParams) -> Result<JobState, PromoteError> {
        let batch_key = self.key.batch(batch_number);
        self.stores.statuses.update(
            &batch_key,
            &StatusPatch::status(JobState::InProgress)
                .with_stage(Stage::PromoteCopy, JobState::InProgress),
        );

        match self.execute(&batch_key, batch_number, params).await {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::error!(job_key = %self.key, batch = batch_number, error = %e, "batch failed");
                self.stores.statuses.update(
                    &batch_key,
                    &StatusPatch::status(JobState::Failed)
                        .with_message(e.to_string())
                        .with_stage(Stage::PromoteCopy, JobState::Failed),
                );
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        batch_key: &JobKey,
        batch_number: u32,
        params: &JobParams,
    ) -> Result<JobState, PromoteError> {
        let files =
            BatchFiles::new(self.key.clone(), batch_number, Arc::clone(&self.stores.blobs));
        let items = files.read_items()?;
        let site = if self.config.preview_enabled {
            Some(params.site().ok_or_else(|| {
                PromoteError::Validation(format!(
                    "admin_page_uri must carry owner, repo and ref: {}",
                    params.admin_page_uri
                ))
            })?)
        } else {
            None
        };
        tracing::info!(job_key = %self.key, batch = batch_number, items = items.len(), "batch started");

        let mut result = BatchResult::default();
        self.create_folders(&items).await;
        let copied = self.copy_items(&items, &mut result.failed_promotes).await;
        self.stores.statuses.update(
            batch_key,
            &StatusPatch::new()
                .with_stage(Stage::PromoteCopy, JobState::Completed)
                .with_stage(Stage::PostPromote, JobState::InProgress),
        );

        if let Some(site) = site {
            let public: Vec<String> = copied.iter().map(|item| item.public_path()).collect();
            let previewed = self
                .distribute(DistributionOp::Preview, &site, public, &mut result.failed_previews)
                .await;
            if params.do_publish {
                self.distribute(DistributionOp::Publish, &site, previewed, &mut result.failed_publishes)
                    .await;
            }
        }

        files.write_result(&result)?;
        let state = if !items.is_empty() && result.failed_promotes.len() >= items.len() {
            JobState::Failed
        } else if result.is_empty() {
            JobState::Completed
        } else {
            JobState::CompletedWithError
        };
        self.stores.statuses.update(
            batch_key,
            &StatusPatch::status(state).with_stage(Stage::PostPromote, JobState::Completed),
        );
        tracing::info!(
            job_key = %self.key,
            batch = batch_number,
            state = %state,
            failures = result.failure_count(),
            "batch finished"
        );
        Ok(state)
    }

    /// Create every destination folder once, parents first.
    async fn create_folders(&self, items: &[Item]) {
        let folders: BTreeSet<&str> =
            items.iter().map(Item::folder).filter(|folder| *folder != "/").collect();
        for folder in folders {
            let created = self
                .retry
                .run("create_folder", |e: &ContentError| !e.is_locked(), || {
                    self.content.create_folder(folder)
                })
                .await;
            if let Err(e) = created {
                // Uploads into the folder will fail and be recorded per item
                tracing::warn!(job_key = %self.key, folder, error = %e, "failed to create folder");
            }
        }
    }

    /// Copy items in concurrent groups; returns the items that made it.
    async fn copy_items<'a>(&self, items: &'a [Item], failed: &mut Vec<String>) -> Vec<&'a Item> {
        let mut copied = Vec::with_capacity(items.len());
        let groups: Vec<&[Item]> = items.chunks(self.config.copy_concurrency.max(1)).collect();
        let delay = self.config.group_delay();
        for (i, group) in groups.iter().copied().enumerate() {
            let outcomes = join_all(group.iter().map(|item| self.copy_item(item))).await;
            for (item, outcome) in group.iter().zip(outcomes) {
                match outcome {
                    Ok(()) => copied.push(item),
                    Err(e) => {
                        tracing::warn!(job_key = %self.key, path = %item.path, error = %e, "copy failed");
                        if e.is_locked() {
                            failed.push(format!("{} (locked)", item.path));
                        } else {
                            failed.push(item.path.clone());
                        }
                    }
                }
            }
            if i + 1 < groups.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        copied
    }

    async fn copy_item(&self, item: &Item) -> Result<(), ContentError> {
        let content = self
            .retry
            .run("fetch", |e: &ContentError| !e.is_locked(), || self.content.fetch(&item.source))
            .await?;
        self.retry
            .run("upload", |e: &ContentError| !e.is_locked(), || {
                self.content.upload(&item.path, &content)
            })
            .await
    }

    /// Trigger `op` for every path; returns the paths that succeeded.
    async fn distribute(
        &self,
        op: DistributionOp,
        site: &SiteRef,
        paths: Vec<String>,
        failed: &mut Vec<String>,
    ) -> Vec<String> {
        let mut done = Vec::with_capacity(paths.len());
        for group in paths.chunks(self.config.copy_concurrency.max(1)) {
            let outcomes = join_all(group.iter().map(|path| {
                self.retry.run("distribution", |_| true, move || {
                    self.distribution.trigger(op, site, path)
                })
            }))
            .await;
            for (path, outcome) in group.iter().zip(outcomes) {
                match outcome {
                    Ok(()) => done.push(path.clone()),
                    Err(e) => {
                        tracing::warn!(job_key = %self.key, %op, path = %path, error = %e, "distribution failed");
                        failed.push(path.clone());
                    }
                }
            }
        }
        done
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
