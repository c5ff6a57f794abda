// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-batch results and the final report row.

use crate::time_fmt::format_utc;
use serde::{Deserialize, Serialize};

/// Failures recorded by one worker, or accumulated across a whole job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    #[serde(default)]
    pub failed_promotes: Vec<String>,
    #[serde(default)]
    pub failed_previews: Vec<String>,
    #[serde(default)]
    pub failed_publishes: Vec<String>,
}

impl BatchResult {
    /// Append another result's failures, keeping batch order.
    pub fn merge(&mut self, other: BatchResult) {
        self.failed_promotes.extend(other.failed_promotes);
        self.failed_previews.extend(other.failed_previews);
        self.failed_publishes.extend(other.failed_publishes);
    }

    pub fn is_empty(&self) -> bool {
        self.failed_promotes.is_empty()
            && self.failed_previews.is_empty()
            && self.failed_publishes.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.failed_promotes.len() + self.failed_previews.len() + self.failed_publishes.len()
    }
}

/// One row appended to the project's report table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub phase: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub failures: BatchResult,
}

impl ReportRow {
    pub fn promote(start: Option<u64>, end: Option<u64>, failures: BatchResult) -> Self {
        Self { phase: "PROMOTE".to_string(), start, end, failures }
    }

    /// Row of a floodgate copy; failed copies fill the first failure column.
    pub fn copy(start: Option<u64>, end: Option<u64>, failed_copies: Vec<String>) -> Self {
        Self {
            phase: "COPY".to_string(),
            start,
            end,
            failures: BatchResult { failed_promotes: failed_copies, ..BatchResult::default() },
        }
    }

    /// Cell values: phase, start, end, then each failure list newline-joined.
    pub fn columns(&self) -> Vec<String> {
        vec![
            self.phase.clone(),
            format_utc(self.start),
            format_utc(self.end),
            self.failures.failed_promotes.join("\n"),
            self.failures.failed_previews.join("\n"),
            self.failures.failed_publishes.join("\n"),
        ]
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
