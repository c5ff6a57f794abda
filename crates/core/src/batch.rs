// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch lifecycle fields tracked in the instance descriptor.

use crate::id::ActivationId;
use crate::status::{JobState, JobStatus};
use serde::{Deserialize, Serialize};

/// Lifecycle of one batch.
///
/// ```text
/// NOT_STARTED ─claim─► TRIGGERED ─copy settled─► COPY_DONE ─post settled─► DONE
///      ▲                   │                                    │
///      └──stale claim──────┤                                    │
///                          └──────launch failed───► FAILED ◄────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    NotStarted,
    Triggered,
    CopyDone,
    Done,
    Failed,
}

crate::simple_display! {
    BatchState {
        NotStarted => "NOT_STARTED",
        Triggered => "TRIGGERED",
        CopyDone => "COPY_DONE",
        Done => "DONE",
        Failed => "FAILED",
    }
}

/// One batch entry of the instance descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// 1-based, contiguous
    pub batch_number: u32,
    pub state: BatchState,
    pub item_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_id: Option<ActivationId>,
    /// Epoch ms when a tick claimed this batch for triggering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
    /// Last status observed on the batch's own status record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobState>,
}

impl Batch {
    pub fn new(batch_number: u32, item_count: usize) -> Self {
        Self {
            batch_number,
            state: BatchState::NotStarted,
            item_count,
            activation_id: None,
            claimed_at: None,
            start_time: None,
            end_time: None,
            status: None,
        }
    }

    /// Triggered and the copy phase has not been settled yet.
    pub fn is_copy_in_flight(&self) -> bool {
        self.state == BatchState::Triggered
    }

    /// Copy phase is over, successfully or not.
    pub fn is_copy_settled(&self) -> bool {
        matches!(self.state, BatchState::CopyDone | BatchState::Done | BatchState::Failed)
    }

    /// Nothing more will happen to this batch.
    pub fn is_settled(&self) -> bool {
        matches!(self.state, BatchState::Done | BatchState::Failed)
    }

    /// Reserve the batch for triggering before the launcher is called.
    pub fn claim(&mut self, now_ms: u64) {
        self.state = BatchState::Triggered;
        self.claimed_at = Some(now_ms);
        self.activation_id = None;
    }

    /// Give up a claim that never got an activation recorded.
    pub fn release_claim(&mut self) {
        self.state = BatchState::NotStarted;
        self.claimed_at = None;
    }

    pub fn record_activation(&mut self, id: ActivationId) {
        self.activation_id = Some(id);
    }

    /// Claimed but the launcher handle was never recorded, for longer than
    /// `timeout_ms`.
    pub fn is_stale_claim(&self, now_ms: u64, timeout_ms: u64) -> bool {
        self.state == BatchState::Triggered
            && self.activation_id.is_none()
            && self.claimed_at.is_some_and(|at| now_ms.saturating_sub(at) >= timeout_ms)
    }

    pub fn mark_copy_done(&mut self, record: Option<&JobStatus>) {
        self.state = BatchState::CopyDone;
        self.copy_times(record);
    }

    /// Settle the post-copy phase; a FAILED batch record fails the batch.
    pub fn mark_done(&mut self, record: Option<&JobStatus>) {
        self.copy_times(record);
        self.state = match self.status {
            Some(JobState::Failed) => BatchState::Failed,
            _ => BatchState::Done,
        };
    }

    pub fn mark_failed(&mut self, now_ms: u64) {
        self.state = BatchState::Failed;
        self.status = Some(JobState::Failed);
        self.start_time.get_or_insert(now_ms);
        self.end_time = Some(now_ms);
    }

    /// Copy timestamps and status off the batch's status record.
    pub fn copy_times(&mut self, record: Option<&JobStatus>) {
        let Some(record) = record else {
            return;
        };
        if record.start_time.is_some() {
            self.start_time = record.start_time;
        }
        if record.end_time.is_some() {
            self.end_time = record.end_time;
        }
        if record.status.is_some() {
            self.status = record.status;
        }
    }
}

crate::builder! {
    pub struct BatchBuilder => Batch {
        set {
            batch_number: u32 = 1,
            state: BatchState = BatchState::NotStarted,
            item_count: usize = 1,
        }
        option {
            activation_id: ActivationId = None,
            claimed_at: u64 = None,
            start_time: u64 = None,
            end_time: u64 = None,
            status: JobState = None,
        }
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
