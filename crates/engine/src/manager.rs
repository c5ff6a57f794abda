// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch manager: owns the instance descriptor and batch files.
//!
//! Every descriptor write after planning is conditional on the revision the
//! writer read, so two overlapping ticks can never both claim a batch.

use crate::planner::write_batch_items;
use crate::stores::Stores;
use fg_adapters::{WorkerLauncher, WorkerRequest};
use fg_core::{
    ActivationId, Batch, BatchResult, BatchState, Clock, InstanceDescriptor, Item, JobKey,
    JobParams, JobState, PromoteConfig, PromoteError, RunMetadata, Stage, StatusPatch,
};
use fg_storage::{layout, BlobError, BlobStore, BlobStoreExt, Revision};
use std::sync::Arc;

/// Attempts at re-applying a change after losing a conditional write
const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Result of trying to trigger one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Worker launched and its handle recorded
    Launched { activation_id: ActivationId, revision: Revision },
    /// Another writer changed the descriptor first; nothing was launched
    Contended,
    /// The launcher refused; the batch is now FAILED
    LaunchFailed { error: PromoteError, revision: Revision },
}

/// Item list and result file of one batch.
#[derive(Clone)]
pub struct BatchFiles {
    key: JobKey,
    batch_number: u32,
    blobs: Arc<dyn BlobStore>,
}

impl BatchFiles {
    pub fn new(key: JobKey, batch_number: u32, blobs: Arc<dyn BlobStore>) -> Self {
        Self { key, batch_number, blobs }
    }

    pub fn batch_number(&self) -> u32 {
        self.batch_number
    }

    pub fn read_items(&self) -> Result<Vec<Item>, PromoteError> {
        let path = layout::batch_items_path(&self.key, self.batch_number);
        self.blobs
            .read_json(&path)
            .map_err(PromoteError::storage)?
            .ok_or_else(|| PromoteError::Storage(format!("missing item list {path}")))
    }

    /// The batch's result, if its worker wrote one.
    pub fn read_result(&self) -> Result<Option<BatchResult>, BlobError> {
        self.blobs.read_json(&layout::batch_result_path(&self.key, self.batch_number))
    }

    pub fn write_result(&self, result: &BatchResult) -> Result<(), PromoteError> {
        self.blobs
            .write_json(&layout::batch_result_path(&self.key, self.batch_number), result)
            .map_err(PromoteError::storage)?;
        Ok(())
    }
}

pub struct BatchManager<L, C: Clock> {
    key: JobKey,
    stores: Stores<C>,
    launcher: L,
    config: PromoteConfig,
    /// Items of the batch being filled by `add_item`
    open_items: Vec<Item>,
    descriptor: Option<InstanceDescriptor>,
    current_batch: Option<u32>,
}

impl<L, C> BatchManager<L, C>
where
    L: WorkerLauncher,
    C: Clock,
{
    pub fn new(key: JobKey, stores: Stores<C>, launcher: L, config: PromoteConfig) -> Self {
        Self {
            key,
            stores,
            launcher,
            config,
            open_items: Vec::new(),
            descriptor: None,
            current_batch: None,
        }
    }

    pub fn key(&self) -> &JobKey {
        &self.key
    }

    pub fn stores(&self) -> &Stores<C> {
        &self.stores
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Load the instance descriptor, or start a new empty one for `params`.
    ///
    /// A new descriptor is not persisted until [`finalize_instance`](Self::finalize_instance).
    pub fn init(&mut self, params: JobParams) -> Result<&InstanceDescriptor, PromoteError> {
        let descriptor = match self.get_instance_data()? {
            Some((descriptor, _)) => descriptor,
            None => InstanceDescriptor::new(
                self.key.clone(),
                RunMetadata {
                    params,
                    batch_size: self.config.max_items_per_batch,
                    created_at: self.stores.now(),
                },
            ),
        };
        self.open_items.clear();
        Ok(self.descriptor.insert(descriptor))
    }

    fn planning(&mut self) -> Result<&mut InstanceDescriptor, PromoteError> {
        self.descriptor
            .as_mut()
            .ok_or_else(|| PromoteError::Storage("batch manager used before init".into()))
    }

    /// Append `item` to the open batch, flushing it once it is full.
    pub fn add_item(&mut self, item: Item) -> Result<(), PromoteError> {
        let batch_size = self.planning()?.metadata.batch_size.max(1);
        self.open_items.push(item);
        if self.open_items.len() >= batch_size {
            self.flush_open_batch()?;
        }
        Ok(())
    }

    fn flush_open_batch(&mut self) -> Result<(), PromoteError> {
        if self.open_items.is_empty() {
            return Ok(());
        }
        let items = std::mem::take(&mut self.open_items);
        let key = self.key.clone();
        let blobs = Arc::clone(&self.stores.blobs);
        let descriptor = self.planning()?;
        let batch_number = descriptor.batches.len() as u32 + 1;
        write_batch_items(blobs.as_ref(), &key, batch_number, &items)?;
        descriptor.batches.push(Batch::new(batch_number, items.len()));
        // A record left by an earlier run would read as this batch's progress
        self.stores.statuses.reset(&key.batch(batch_number)).map_err(PromoteError::storage)?;
        Ok(())
    }

    /// Close the open batch, persist the descriptor and trigger batch 1.
    pub async fn finalize_instance(&mut self) -> Result<InstanceDescriptor, PromoteError> {
        self.flush_open_batch()?;
        let descriptor = self.planning()?.clone();
        let path = layout::descriptor_path(&self.key);
        let revision =
            self.stores.blobs.write_json(&path, &descriptor).map_err(PromoteError::storage)?;
        tracing::info!(
            job_key = %self.key,
            batches = descriptor.batches.len(),
            items = descriptor.total_items(),
            "instance finalized"
        );

        let Some(first) = descriptor.batches.first().map(|b| b.batch_number) else {
            return Ok(descriptor);
        };
        let mut descriptor = descriptor;
        match self.trigger_batch(&mut descriptor, revision, first).await? {
            TriggerOutcome::Contended => {
                tracing::warn!(job_key = %self.key, "descriptor changed while triggering batch 1");
            }
            TriggerOutcome::Launched { .. } | TriggerOutcome::LaunchFailed { .. } => {}
        }
        self.descriptor = Some(descriptor.clone());
        Ok(descriptor)
    }

    /// The persisted descriptor and its revision; `None` means nothing to run.
    pub fn get_instance_data(
        &self,
    ) -> Result<Option<(InstanceDescriptor, Revision)>, PromoteError> {
        self.stores
            .blobs
            .read_json_versioned(&layout::descriptor_path(&self.key))
            .map_err(PromoteError::storage)
    }

    /// Persist `descriptor` if it is still at `expected`.
    pub fn write_to_instance_file(
        &self,
        descriptor: &InstanceDescriptor,
        expected: Revision,
    ) -> Result<Revision, BlobError> {
        self.stores.blobs.write_json_if(&layout::descriptor_path(&self.key), descriptor, Some(expected))
    }

    /// Apply `change` and persist, re-reading and re-applying after a lost
    /// conditional write. `change` returns `false` when the change no longer
    /// applies to what it sees, which ends the attempt without writing.
    pub fn update_instance(
        &self,
        descriptor: &mut InstanceDescriptor,
        mut revision: Revision,
        mut change: impl FnMut(&mut InstanceDescriptor) -> bool,
    ) -> Result<Option<Revision>, PromoteError> {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            if !change(descriptor) {
                return Ok(None);
            }
            match self.write_to_instance_file(descriptor, revision) {
                Ok(written) => return Ok(Some(written)),
                Err(BlobError::Conflict(_)) => {
                    let Some((fresh, fresh_rev)) = self.get_instance_data()? else {
                        return Err(PromoteError::Storage("instance descriptor disappeared".into()));
                    };
                    *descriptor = fresh;
                    revision = fresh_rev;
                }
                Err(e) => return Err(PromoteError::storage(e)),
            }
        }
        Err(PromoteError::Storage(format!(
            "instance descriptor kept changing after {MAX_UPDATE_ATTEMPTS} attempts"
        )))
    }

    /// Position on one batch for reading its files.
    pub fn init_batch(&mut self, batch_number: u32) {
        self.current_batch = Some(batch_number);
    }

    pub fn get_current_batch(&self) -> Option<BatchFiles> {
        self.current_batch.map(|n| self.batch_files(n))
    }

    pub fn batch_files(&self, batch_number: u32) -> BatchFiles {
        BatchFiles::new(self.key.clone(), batch_number, Arc::clone(&self.stores.blobs))
    }

    /// Persist the job-level result. Batch files are kept so the result can
    /// be recomputed.
    pub fn mark_complete(&self, result: &BatchResult) -> Result<(), PromoteError> {
        self.stores
            .blobs
            .write_json(&layout::final_result_path(&self.key), result)
            .map_err(PromoteError::storage)?;
        tracing::info!(job_key = %self.key, failures = result.failure_count(), "instance marked complete");
        Ok(())
    }

    /// The job-level result, once complete.
    pub fn read_final_result(&self) -> Result<Option<BatchResult>, PromoteError> {
        self.stores
            .blobs
            .read_json(&layout::final_result_path(&self.key))
            .map_err(PromoteError::storage)
    }

    /// The report row already appended for this instance, if any.
    pub fn reported_row(&self) -> Result<Option<Vec<String>>, PromoteError> {
        self.stores
            .blobs
            .read_json(&layout::reported_row_path(&self.key))
            .map_err(PromoteError::storage)
    }

    pub fn record_reported_row(&self, columns: &[String]) -> Result<(), PromoteError> {
        self.stores
            .blobs
            .write_json(&layout::reported_row_path(&self.key), &columns)
            .map_err(PromoteError::storage)?;
        Ok(())
    }

    /// Remove every artifact of earlier runs of this job.
    pub fn cleanup_files(&mut self) -> Result<usize, PromoteError> {
        let removed = self
            .stores
            .blobs
            .delete(&layout::instance_prefix(&self.key))
            .map_err(PromoteError::storage)?;
        self.descriptor = None;
        self.open_items.clear();
        if removed > 0 {
            tracing::info!(job_key = %self.key, removed, "removed stale instance files");
        }
        Ok(removed)
    }

    /// Claim, launch and record one batch.
    ///
    /// `descriptor` must be the state read at `revision`, possibly with
    /// in-memory changes from the current tick; the claim write persists
    /// those too.
    pub async fn trigger_batch(
        &self,
        descriptor: &mut InstanceDescriptor,
        revision: Revision,
        batch_number: u32,
    ) -> Result<TriggerOutcome, PromoteError> {
        let claimed_at = self.stores.now();
        let Some(batch) = descriptor.batch_mut(batch_number) else {
            return Err(PromoteError::Storage(format!("no batch {batch_number} in descriptor")));
        };
        batch.claim(claimed_at);
        let revision = match self.write_to_instance_file(descriptor, revision) {
            Ok(revision) => revision,
            Err(BlobError::Conflict(_)) => {
                tracing::info!(job_key = %self.key, batch = batch_number, "lost claim to another tick");
                return Ok(TriggerOutcome::Contended);
            }
            Err(e) => return Err(PromoteError::storage(e)),
        };

        let request = WorkerRequest {
            job_key: self.key.clone(),
            batch_number,
            params: descriptor.metadata.params.clone(),
        };
        let batch_key = self.key.batch(batch_number);
        let still_ours = move |d: &InstanceDescriptor| {
            d.batch(batch_number).is_some_and(|b| {
                b.state == BatchState::Triggered
                    && b.claimed_at == Some(claimed_at)
                    && b.activation_id.is_none()
            })
        };

        match self.launcher.invoke(&self.config.worker_action, &request).await {
            Ok(activation_id) => {
                let now = self.stores.now();
                let id = activation_id.clone();
                let written = self.update_instance(descriptor, revision, |d| {
                    if !still_ours(&*d) {
                        return false;
                    }
                    if let Some(b) = d.batch_mut(batch_number) {
                        b.record_activation(id.clone());
                        b.start_time.get_or_insert(now);
                    }
                    true
                })?;
                let Some(revision) = written else {
                    tracing::warn!(
                        job_key = %self.key,
                        batch = batch_number,
                        activation_id = %activation_id,
                        "claim was released before the activation could be recorded"
                    );
                    return Ok(TriggerOutcome::Contended);
                };
                self.stores.statuses.update(
                    &self.key,
                    &StatusPatch::status(JobState::InProgress)
                        .with_activation_id(activation_id.clone())
                        .with_stage(Stage::PromoteCopy, JobState::Started),
                );
                tracing::info!(
                    job_key = %self.key,
                    batch = batch_number,
                    activation_id = %activation_id,
                    "batch triggered"
                );
                Ok(TriggerOutcome::Launched { activation_id, revision })
            }
            Err(e) => {
                let error = PromoteError::Invocation { batch: batch_number, message: e.to_string() };
                tracing::error!(job_key = %self.key, batch = batch_number, error = %e, "failed to invoke worker");
                let now = self.stores.now();
                let written = self.update_instance(descriptor, revision, |d| {
                    if !still_ours(&*d) {
                        return false;
                    }
                    if let Some(b) = d.batch_mut(batch_number) {
                        b.mark_failed(now);
                    }
                    true
                })?;
                self.stores.statuses.update(
                    &batch_key,
                    &StatusPatch::status(JobState::Failed).with_message(error.to_string()),
                );
                self.stores
                    .statuses
                    .update(&self.key, &StatusPatch::new().with_message(error.to_string()));
                match written {
                    Some(revision) => Ok(TriggerOutcome::LaunchFailed { error, revision }),
                    None => Ok(TriggerOutcome::Contended),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
