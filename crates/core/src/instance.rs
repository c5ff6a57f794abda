// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The instance descriptor: single source of truth for one promote run.

use crate::batch::{Batch, BatchState};
use crate::config::JobParams;
use crate::key::JobKey;
use crate::status::JobState;
use serde::{Deserialize, Serialize};

/// Run metadata captured when the instance was planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Parameters forwarded to every worker of this run
    pub params: JobParams,
    pub batch_size: usize,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    pub job_key: JobKey,
    pub metadata: RunMetadata,
    #[serde(default)]
    pub batches: Vec<Batch>,
    /// Final job state once the result has been aggregated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<JobState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    /// Epoch ms when a tick claimed the final aggregation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalizing_since: Option<u64>,
}

impl InstanceDescriptor {
    pub fn new(job_key: JobKey, metadata: RunMetadata) -> Self {
        Self {
            job_key,
            metadata,
            batches: Vec::new(),
            outcome: None,
            completed_at: None,
            finalizing_since: None,
        }
    }

    pub fn batch(&self, batch_number: u32) -> Option<&Batch> {
        self.batches.iter().find(|b| b.batch_number == batch_number)
    }

    pub fn batch_mut(&mut self, batch_number: u32) -> Option<&mut Batch> {
        self.batches.iter_mut().find(|b| b.batch_number == batch_number)
    }

    pub fn total_items(&self) -> usize {
        self.batches.iter().map(|b| b.item_count).sum()
    }

    /// Number of batches that have been triggered at least once, and the total.
    pub fn progress(&self) -> (usize, usize) {
        let started = self
            .batches
            .iter()
            .filter(|b| b.state != BatchState::NotStarted || b.activation_id.is_some())
            .count();
        (started, self.batches.len())
    }

    /// Batches currently TRIGGERED and not yet COPY_DONE.
    pub fn copy_in_flight(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter().filter(|b| b.is_copy_in_flight())
    }

    pub fn all_copy_settled(&self) -> bool {
        self.batches.iter().all(Batch::is_copy_settled)
    }

    pub fn all_settled(&self) -> bool {
        self.batches.iter().all(Batch::is_settled)
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    /// Another tick claimed the aggregation less than `timeout_ms` ago.
    pub fn is_finalizing(&self, now_ms: u64, timeout_ms: u64) -> bool {
        self.finalizing_since.is_some_and(|at| now_ms.saturating_sub(at) < timeout_ms)
    }

    /// Record the job outcome; the instance accepts no further ticks.
    pub fn complete(&mut self, outcome: JobState, now_ms: u64) {
        self.outcome = Some(outcome);
        self.completed_at = Some(now_ms);
        self.finalizing_since = None;
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
