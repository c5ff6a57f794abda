// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Floodgate tree jobs: create the staging tree by copying production
//! documents into it, or delete it again.
//!
//! Each run is one worker invocation tracked by its own status record,
//! keyed `<kind>~<root><project>` so it never collides with a promote.

use crate::discovery::discover_production;
use crate::retry::RetryPolicy;
use crate::stores::Stores;
use fg_adapters::{ContentBackend, ContentError, ReportSink, WorkerLauncher, WorkerRequest};
use fg_core::{
    ActivationId, Clock, Item, JobKey, JobParams, JobState, PromoteConfig, PromoteError,
    ReportRow, StatusPatch,
};
use futures_util::future::join_all;
use serde::Serialize;

pub(crate) const COPY_SUCCESS_MESSAGE: &str = "All tasks for Floodgate Copy completed";
pub(crate) const COPY_ERROR_MESSAGE: &str =
    "Error occurred when floodgating content. Check project excel sheet for additional information.";
pub(crate) const DELETE_SUCCESS_MESSAGE: &str = "Floodgate tree deleted.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeJob {
    Copy,
    Delete,
}

fg_core::simple_display! {
    TreeJob {
        Copy => "copy",
        Delete => "delete",
    }
}

impl TreeJob {
    /// Name the worker is launched under.
    pub fn worker_action(self) -> &'static str {
        match self {
            TreeJob::Copy => "copy-worker",
            TreeJob::Delete => "delete-worker",
        }
    }

    pub fn from_worker_action(action: &str) -> Option<Self> {
        [TreeJob::Copy, TreeJob::Delete].into_iter().find(|job| job.worker_action() == action)
    }

    pub fn key(self, params: &JobParams) -> JobKey {
        JobKey::new(format!("{self}~{}{}", params.fg_root_folder, params.project_excel_path))
    }
}

/// What `start_tree_job` launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeStart {
    pub job: TreeJob,
    pub job_key: JobKey,
    pub activation_id: ActivationId,
}

/// How a tree job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeOutcome {
    pub state: JobState,
    /// Documents copied, or staged paths deleted
    pub processed: usize,
    pub failed: Vec<String>,
}

/// Validate `params` and launch the worker of `job`.
///
/// Refused while an earlier run of the same job is in progress and its
/// worker is still alive, unless the config skips that check.
pub async fn start_tree_job<L, C>(
    stores: &Stores<C>,
    launcher: &L,
    config: &PromoteConfig,
    job: TreeJob,
    params: JobParams,
) -> Result<TreeStart, PromoteError>
where
    L: WorkerLauncher,
    C: Clock,
{
    let key = job.key(&params);
    if let Err(e) = params.validate() {
        tracing::error!(job_key = %key, %job, error = %e, "invalid parameters");
        if !params.fg_root_folder.trim().is_empty() && !params.project_excel_path.trim().is_empty() {
            stores
                .statuses
                .update(&key, &StatusPatch::status(JobState::Failed).with_message(e.to_string()));
        }
        return Err(e);
    }

    if !config.skip_in_progress_check && still_running(stores, launcher, &key).await {
        return Err(PromoteError::InProgress(format!("a {job} job is already running for {key}")));
    }

    stores.statuses.reset(&key).map_err(PromoteError::storage)?;
    stores.statuses.update(
        &key,
        &StatusPatch::status(JobState::Started)
            .with_kind(job.to_string())
            .with_message(format!("Triggering {job} action")),
    );

    let request = WorkerRequest { job_key: key.clone(), batch_number: 0, params };
    match launcher.invoke(job.worker_action(), &request).await {
        Ok(activation_id) => {
            stores.statuses.update(
                &key,
                &StatusPatch::status(JobState::InProgress).with_activation_id(activation_id.clone()),
            );
            tracing::info!(job_key = %key, %job, activation_id = %activation_id, "tree job launched");
            Ok(TreeStart { job, job_key: key, activation_id })
        }
        Err(e) => {
            tracing::error!(job_key = %key, %job, error = %e, "failed to launch worker");
            stores.statuses.update(
                &key,
                &StatusPatch::status(JobState::Failed)
                    .with_message(format!("Failed to invoke actions {e}")),
            );
            Err(PromoteError::Invocation { batch: request.batch_number, message: e.to_string() })
        }
    }
}

/// An in-progress record whose worker still answers, or has no handle yet.
async fn still_running<L: WorkerLauncher, C: Clock>(
    stores: &Stores<C>,
    launcher: &L,
    key: &JobKey,
) -> bool {
    let Some(status) = stores.statuses.read(key) else {
        return false;
    };
    if !status.is_in_progress() {
        return false;
    }
    let Some(activation) = &status.activation_id else {
        return true;
    };
    match launcher.is_alive(activation).await {
        Ok(alive) => {
            if !alive {
                tracing::warn!(job_key = %key, activation_id = %activation, "previous worker is gone, starting over");
            }
            alive
        }
        Err(e) => {
            tracing::warn!(job_key = %key, error = %e, "liveness probe failed, assuming alive");
            true
        }
    }
}

/// Worker side of a copy or delete.
pub struct TreeWorker<B, R, C: Clock> {
    job: TreeJob,
    key: JobKey,
    stores: Stores<C>,
    content: B,
    report: R,
    config: PromoteConfig,
    retry: RetryPolicy,
}

impl<B, R, C> TreeWorker<B, R, C>
where
    B: ContentBackend,
    R: ReportSink,
    C: Clock,
{
    pub fn new(
        job: TreeJob,
        key: JobKey,
        stores: Stores<C>,
        content: B,
        report: R,
        config: PromoteConfig,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self { job, key, stores, content, report, config, retry }
    }

    /// Run the job to its terminal state.
    ///
    /// Per-path failures end up in the outcome; only an unwritable report
    /// row fails the run.
    pub async fn run(&self, params: &JobParams) -> Result<TreeOutcome, PromoteError> {
        let result = match self.job {
            TreeJob::Copy => self.copy(params).await,
            TreeJob::Delete => Ok(self.delete().await),
        };
        if let Err(e) = &result {
            tracing::error!(job_key = %self.key, job = %self.job, error = %e, "tree job failed");
            self.stores.statuses.update(
                &self.key,
                &StatusPatch::status(JobState::CompletedWithError).with_message(e.to_string()),
            );
        }
        result
    }

    async fn copy(&self, params: &JobParams) -> Result<TreeOutcome, PromoteError> {
        self.progress("Getting all files to be floodgated.");
        let docs = discover_production(&self.content, &self.config.discovery_folders).await;
        self.progress(format!("Start floodgating {} files.", docs.len()));

        let mut failed = Vec::new();
        let groups: Vec<&[Item]> = docs.chunks(self.config.copy_concurrency.max(1)).collect();
        let delay = self.config.group_delay();
        for (i, group) in groups.iter().copied().enumerate() {
            let outcomes = join_all(group.iter().map(|doc| {
                self.retry.run("copy_to_staging", |e: &ContentError| !e.is_locked(), || {
                    self.content.copy_to_staging(&doc.path)
                })
            }))
            .await;
            for (doc, outcome) in group.iter().zip(outcomes) {
                if let Err(e) = outcome {
                    tracing::warn!(job_key = %self.key, path = %doc.path, error = %e, "copy failed");
                    failed.push(failure_label(&doc.path, &e));
                }
            }
            tracing::info!(job_key = %self.key, group = i + 1, of = groups.len(), "copy group finished");
            if i + 1 < groups.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let (state, message) = if failed.is_empty() {
            (JobState::Completed, COPY_SUCCESS_MESSAGE)
        } else {
            (JobState::CompletedWithError, COPY_ERROR_MESSAGE)
        };
        self.stores.statuses.update(&self.key, &StatusPatch::status(state).with_message(message));

        let (start, end) = self.stores.statuses.start_end_time(&self.key);
        let row = ReportRow::copy(start, end, failed.clone());
        self.report
            .append_row(&params.project_excel_path, &self.config.copy_report_table, &row.columns())
            .await
            .map_err(|e| PromoteError::Network(format!("failed to append report row: {e}")))?;

        tracing::info!(job_key = %self.key, %state, copied = docs.len() - failed.len(), failed = failed.len(), "copy finished");
        Ok(TreeOutcome { state, processed: docs.len() - failed.len(), failed })
    }

    /// Delete everything staged under the configured folders, keeping the
    /// folders themselves.
    async fn delete(&self) -> TreeOutcome {
        self.progress("Started deleting content.");
        let mut processed = 0;
        let mut failed = Vec::new();
        for folder in &self.config.discovery_folders {
            let children = match self.content.list_children(folder).await {
                Ok(children) => children,
                Err(ContentError::NotFound(_)) => continue,
                Err(e) => {
                    tracing::warn!(job_key = %self.key, folder = %folder, error = %e, "failed to list folder");
                    failed.push(folder.clone());
                    continue;
                }
            };
            for child in children {
                let deleted = self
                    .retry
                    .run("delete_staged", |e: &ContentError| !e.is_locked(), || {
                        self.content.delete_staged(&child.path)
                    })
                    .await;
                match deleted {
                    Ok(()) => processed += 1,
                    Err(ContentError::NotFound(_)) => {}
                    Err(e) => {
                        tracing::warn!(job_key = %self.key, path = %child.path, error = %e, "delete failed");
                        failed.push(failure_label(&child.path, &e));
                    }
                }
            }
        }

        let (state, message) = if failed.is_empty() {
            (JobState::Completed, DELETE_SUCCESS_MESSAGE.to_string())
        } else {
            (JobState::CompletedWithError, format!("Failed to delete: {}", failed.join(", ")))
        };
        self.stores.statuses.update(&self.key, &StatusPatch::status(state).with_message(message));
        tracing::info!(job_key = %self.key, %state, deleted = processed, failed = failed.len(), "delete finished");
        TreeOutcome { state, processed, failed }
    }

    fn progress(&self, message: impl Into<String>) {
        self.stores
            .statuses
            .update(&self.key, &StatusPatch::status(JobState::InProgress).with_message(message));
    }
}

fn failure_label(path: &str, e: &ContentError) -> String {
    if e.is_locked() {
        format!("{path} (locked)")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
