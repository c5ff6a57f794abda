// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status records and their merge-update semantics.
//!
//! A [`JobStatus`] is the user-visible progress record of a promote job or of
//! one batch. Updates are merges: a [`StatusPatch`] only touches the fields it
//! carries, so an update never clears a field it does not mention.

use crate::id::ActivationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a job or batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Started,
    InProgress,
    Completed,
    CompletedWithError,
    Failed,
}

impl JobState {
    /// True while work is still expected to happen.
    pub fn is_in_progress(self) -> bool {
        matches!(self, JobState::Started | JobState::InProgress)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_in_progress()
    }

    /// Whether a record in `self` may move to `next`.
    ///
    /// Terminal states only accept a rewrite of the same state; leaving them
    /// requires an explicit reset. `InProgress` never falls back to `Started`.
    pub fn can_transition_to(self, next: JobState) -> bool {
        match self {
            JobState::Started => true,
            JobState::InProgress => next != JobState::Started,
            _ => self == next,
        }
    }
}

crate::simple_display! {
    JobState {
        Started => "STARTED",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        CompletedWithError => "COMPLETED_WITH_ERROR",
        Failed => "FAILED",
    }
}

/// Sub-phases tracked inside one status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetch-and-upload of the batch's items
    PromoteCopy,
    /// Preview and publish of the copied items
    PostPromote,
}

crate::simple_display! {
    Stage {
        PromoteCopy => "promote_copy",
        PostPromote => "post_promote",
    }
}

/// Persisted status record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_id: Option<ActivationId>,
    /// Epoch ms when the record was first written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    /// Epoch ms when the record entered its terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stage_details: BTreeMap<Stage, JobState>,
}

impl JobStatus {
    /// Status of one sub-phase, if recorded.
    pub fn stage(&self, stage: Stage) -> Option<JobState> {
        self.stage_details.get(&stage).copied()
    }

    pub fn is_in_progress(&self) -> bool {
        self.status.is_some_and(JobState::is_in_progress)
    }

    /// First-seen start time and terminal-update time.
    pub fn start_end_time(&self) -> (Option<u64>, Option<u64>) {
        (self.start_time, self.end_time)
    }

    /// Merge `patch` into this record at `now_ms`.
    ///
    /// Returns `false` when the patch asked for a status transition the state
    /// machine forbids; the status is then left untouched while every other
    /// field of the patch still applies.
    pub fn merge(&mut self, patch: &StatusPatch, now_ms: u64) -> bool {
        if self.start_time.is_none() {
            self.start_time = Some(now_ms);
        }
        if let Some(kind) = &patch.kind {
            self.kind = Some(kind.clone());
        }
        if let Some(message) = &patch.message {
            self.message = Some(message.clone());
        }
        if let Some(activation_id) = &patch.activation_id {
            self.activation_id = Some(activation_id.clone());
        }
        for (stage, state) in &patch.stage_details {
            match state {
                Some(state) => {
                    self.stage_details.insert(*stage, *state);
                }
                None => {
                    self.stage_details.remove(stage);
                }
            }
        }

        let Some(next) = patch.status else {
            return true;
        };
        match self.status {
            Some(current) if !current.can_transition_to(next) => false,
            Some(current) if current == next => true,
            _ => {
                self.status = Some(next);
                if next.is_terminal() {
                    self.end_time = Some(now_ms);
                }
                true
            }
        }
    }
}

/// Partial update of a [`JobStatus`]. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPatch {
    pub kind: Option<String>,
    pub status: Option<JobState>,
    pub message: Option<String>,
    pub activation_id: Option<ActivationId>,
    /// `Some(state)` sets a stage, `None` removes it
    pub stage_details: BTreeMap<Stage, Option<JobState>>,
}

impl StatusPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that only changes the status.
    pub fn status(status: JobState) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_activation_id(mut self, id: ActivationId) -> Self {
        self.activation_id = Some(id);
        self
    }

    pub fn with_stage(mut self, stage: Stage, state: JobState) -> Self {
        self.stage_details.insert(stage, Some(state));
        self
    }

    pub fn clear_stage(mut self, stage: Stage) -> Self {
        self.stage_details.insert(stage, None);
        self
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
