// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tick-driven reconciler advancing one promote instance.
//!
//! Ticks arrive from an external timer, at least once, possibly overlapping.
//! Each tick reads the descriptor with its revision, settles what the batch
//! status records say has finished, and then either waits on the single
//! in-flight batch, triggers the next one, or finalizes the job. Every write
//! is conditional on the revision the tick started from; a tick that loses a
//! write backs off with [`TickOutcome::Contended`].

use crate::aggregator::ResultAggregator;
use crate::manager::{BatchManager, TriggerOutcome};
use fg_adapters::{ReportSink, WorkerLauncher};
use fg_core::{
    ActivationId, BatchState, Clock, InstanceDescriptor, JobState, JobStatus, PromoteConfig,
    PromoteError, Stage, StatusPatch,
};
use fg_storage::{BlobError, Revision};
use std::fmt;

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No instance, or nothing left to do
    Idle,
    /// Waiting on a batch that is still running
    InFlight { batch: u32 },
    Triggered { batch: u32, activation_id: ActivationId },
    /// The launcher refused the batch; it is FAILED
    LaunchFailed { batch: u32 },
    /// Another tick changed the descriptor first
    Contended,
    /// The job is complete with this outcome
    Completed(JobState),
    /// The tick hit an error; the job status carries the message
    Errored(String),
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::Idle => write!(f, "idle"),
            TickOutcome::InFlight { batch } => write!(f, "batch {batch} in flight"),
            TickOutcome::Triggered { batch, activation_id } => {
                write!(f, "triggered batch {batch} ({activation_id})")
            }
            TickOutcome::LaunchFailed { batch } => write!(f, "failed to launch batch {batch}"),
            TickOutcome::Contended => write!(f, "contended"),
            TickOutcome::Completed(state) => write!(f, "completed: {state}"),
            TickOutcome::Errored(message) => write!(f, "error: {message}"),
        }
    }
}

pub struct Reconciler<L, R, C: Clock> {
    manager: BatchManager<L, C>,
    aggregator: ResultAggregator<R>,
    config: PromoteConfig,
}

impl<L, R, C> Reconciler<L, R, C>
where
    L: WorkerLauncher,
    R: ReportSink,
    C: Clock,
{
    pub fn new(manager: BatchManager<L, C>, aggregator: ResultAggregator<R>, config: PromoteConfig) -> Self {
        Self { manager, aggregator, config }
    }

    pub fn manager(&self) -> &BatchManager<L, C> {
        &self.manager
    }

    /// Run one tick. Errors never escape: they are recorded on the job
    /// status and reported as [`TickOutcome::Errored`].
    pub async fn tick(&self) -> TickOutcome {
        let key = self.manager.key();
        match self.try_tick().await {
            Ok(outcome) => {
                tracing::debug!(job_key = %key, %outcome, "tick done");
                outcome
            }
            Err(e) => {
                tracing::error!(job_key = %key, error = %e, "tick failed");
                self.manager
                    .stores()
                    .statuses
                    .update(key, &StatusPatch::new().with_message(format!("Promote tracking failed: {e}")));
                TickOutcome::Errored(e.to_string())
            }
        }
    }

    async fn try_tick(&self) -> Result<TickOutcome, PromoteError> {
        let key = self.manager.key();
        let Some((mut descriptor, revision)) = self.manager.get_instance_data()? else {
            tracing::debug!(job_key = %key, "no instance to track");
            return Ok(TickOutcome::Idle);
        };
        if let Some(outcome) = descriptor.outcome {
            return Ok(TickOutcome::Completed(outcome));
        }
        let original = descriptor.clone();

        let mut in_flight = self.settle_copy_phase(&mut descriptor).await;
        if in_flight.is_none() && descriptor.all_copy_settled() {
            in_flight = self.settle_post_phase(&mut descriptor).await;
            if in_flight.is_none() && descriptor.all_settled() {
                return self.finish(descriptor, &original, revision).await;
            }
        }

        if let Some(batch) = in_flight {
            if !self.persist(&descriptor, &original, revision)? {
                return Ok(TickOutcome::Contended);
            }
            self.report_progress(&descriptor);
            return Ok(TickOutcome::InFlight { batch });
        }

        let next = descriptor
            .batches
            .iter()
            .find(|b| b.state == BatchState::NotStarted)
            .map(|b| b.batch_number);
        let Some(batch) = next else {
            if !self.persist(&descriptor, &original, revision)? {
                return Ok(TickOutcome::Contended);
            }
            return Ok(TickOutcome::Idle);
        };

        match self.manager.trigger_batch(&mut descriptor, revision, batch).await? {
            TriggerOutcome::Launched { activation_id, .. } => {
                self.report_progress(&descriptor);
                Ok(TickOutcome::Triggered { batch, activation_id })
            }
            // The job status keeps the launch error as its message
            TriggerOutcome::LaunchFailed { .. } => Ok(TickOutcome::LaunchFailed { batch }),
            TriggerOutcome::Contended => Ok(TickOutcome::Contended),
        }
    }

    /// Scan TRIGGERED batches in order, settling those whose copy phase is
    /// over. Returns the first batch still copying.
    async fn settle_copy_phase(&self, descriptor: &mut InstanceDescriptor) -> Option<u32> {
        let key = self.manager.key();
        let now = self.manager.stores().now();
        for batch in descriptor.batches.iter_mut().filter(|b| b.state == BatchState::Triggered) {
            let batch_number = batch.batch_number;
            let Some(activation_id) = batch.activation_id.clone() else {
                if batch.is_stale_claim(now, self.config.claim_timeout_ms) {
                    tracing::warn!(job_key = %key, batch = batch_number, "releasing stale claim");
                    batch.release_claim();
                    continue;
                }
                return Some(batch_number);
            };

            let record = self.batch_status(batch_number);
            let copying = record
                .as_ref()
                .is_none_or(|r| r.stage(Stage::PromoteCopy).is_some_and(JobState::is_in_progress));
            if copying {
                if self.is_alive(batch_number, &activation_id).await {
                    return Some(batch_number);
                }
                tracing::warn!(
                    job_key = %key,
                    batch = batch_number,
                    activation_id = %activation_id,
                    "worker exited before finishing its copy phase"
                );
            }
            batch.mark_copy_done(record.as_ref());
            tracing::info!(job_key = %key, batch = batch_number, "batch copy phase settled");
        }
        None
    }

    /// Settle COPY_DONE batches whose status record is terminal. Returns the
    /// first batch still previewing or publishing.
    async fn settle_post_phase(&self, descriptor: &mut InstanceDescriptor) -> Option<u32> {
        let key = self.manager.key();
        let mut pending = None;
        for batch in descriptor.batches.iter_mut().filter(|b| b.state == BatchState::CopyDone) {
            let batch_number = batch.batch_number;
            let record = self.batch_status(batch_number);
            if record.as_ref().is_none_or(JobStatus::is_in_progress) {
                if let Some(id) = &batch.activation_id {
                    if !self.is_alive(batch_number, id).await {
                        // No recovery: the batch stays pending until its record settles
                        tracing::warn!(
                            job_key = %key,
                            batch = batch_number,
                            activation_id = %id,
                            "worker exited with its post-promote phase unsettled"
                        );
                    }
                }
                pending.get_or_insert(batch_number);
                continue;
            }
            batch.mark_done(record.as_ref());
            tracing::info!(job_key = %key, batch = batch_number, state = %batch.state, "batch settled");
        }
        pending
    }

    /// Claim the aggregation, run it and record the outcome.
    async fn finish(
        &self,
        mut descriptor: InstanceDescriptor,
        original: &InstanceDescriptor,
        revision: Revision,
    ) -> Result<TickOutcome, PromoteError> {
        let key = self.manager.key();
        let now = self.manager.stores().now();
        if descriptor.is_finalizing(now, self.config.claim_timeout_ms) {
            tracing::debug!(job_key = %key, "another tick is finalizing");
            self.persist(&descriptor, original, revision)?;
            return Ok(TickOutcome::Contended);
        }

        descriptor.finalizing_since = Some(now);
        let revision = match self.manager.write_to_instance_file(&descriptor, revision) {
            Ok(revision) => revision,
            Err(BlobError::Conflict(_)) => return Ok(TickOutcome::Contended),
            Err(e) => return Err(PromoteError::storage(e)),
        };

        match self.aggregator.finalize(&self.manager, &descriptor).await {
            Ok(aggregate) => {
                let outcome = aggregate.outcome;
                self.manager.update_instance(&mut descriptor, revision, |d| {
                    if d.is_complete() {
                        return false;
                    }
                    d.complete(outcome, now);
                    true
                })?;
                Ok(TickOutcome::Completed(outcome))
            }
            Err(e) => {
                let released = self.manager.update_instance(&mut descriptor, revision, |d| {
                    if d.finalizing_since != Some(now) {
                        return false;
                    }
                    d.finalizing_since = None;
                    true
                });
                if let Err(release_err) = released {
                    tracing::warn!(job_key = %key, error = %release_err, "failed to release finalize claim");
                }
                Err(e)
            }
        }
    }

    /// Write the tick's changes, if any. `false` means another tick won.
    fn persist(
        &self,
        descriptor: &InstanceDescriptor,
        original: &InstanceDescriptor,
        revision: Revision,
    ) -> Result<bool, PromoteError> {
        if descriptor == original {
            return Ok(true);
        }
        match self.manager.write_to_instance_file(descriptor, revision) {
            Ok(_) => Ok(true),
            Err(BlobError::Conflict(_)) => {
                tracing::info!(job_key = %self.manager.key(), "descriptor changed during tick");
                Ok(false)
            }
            Err(e) => Err(PromoteError::storage(e)),
        }
    }

    fn report_progress(&self, descriptor: &InstanceDescriptor) {
        let (started, total) = descriptor.progress();
        let message = if total > 1 {
            format!("Promoting batch {started} / {total}.")
        } else {
            "Promoting files.".to_string()
        };
        self.manager
            .stores()
            .statuses
            .update(self.manager.key(), &StatusPatch::status(JobState::InProgress).with_message(message));
    }

    fn batch_status(&self, batch_number: u32) -> Option<JobStatus> {
        self.manager.stores().statuses.read(&self.manager.key().batch(batch_number))
    }

    /// Liveness probe; an unanswerable probe counts as alive.
    async fn is_alive(&self, batch_number: u32, activation_id: &ActivationId) -> bool {
        match self.manager.launcher().is_alive(activation_id).await {
            Ok(alive) => alive,
            Err(e) => {
                tracing::warn!(
                    job_key = %self.manager.key(),
                    batch = batch_number,
                    activation_id = %activation_id,
                    error = %e,
                    "liveness probe failed"
                );
                true
            }
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
