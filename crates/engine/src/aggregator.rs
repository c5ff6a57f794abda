// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Final aggregation of batch results into the job outcome and report row.

use crate::manager::BatchManager;
use fg_adapters::{ReportSink, WorkerLauncher};
use fg_core::{
    BatchResult, BatchState, Clock, InstanceDescriptor, JobState, PromoteConfig, PromoteError,
    ReportRow, Stage, StatusPatch,
};

pub(crate) const SUCCESS_MESSAGE: &str = "Promoted floodgate tree successfully.";
pub(crate) const ERROR_MESSAGE: &str =
    "Error occurred when promoting floodgated content. Check project excel sheet for additional information.";

/// What a finalize pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub outcome: JobState,
    pub failures: BatchResult,
    pub row: ReportRow,
}

pub struct ResultAggregator<R> {
    report: R,
    config: PromoteConfig,
}

impl<R: ReportSink> ResultAggregator<R> {
    pub fn new(report: R, config: PromoteConfig) -> Self {
        Self { report, config }
    }

    /// Merge every batch result, settle the job status, persist the
    /// job-level result and append the report row.
    ///
    /// Missing or unreadable batch results are logged and skipped. Running
    /// this twice over the same batches yields the same outcome and row, and
    /// the row reaches the sink once.
    pub async fn finalize<L, C>(
        &self,
        manager: &BatchManager<L, C>,
        descriptor: &InstanceDescriptor,
    ) -> Result<Aggregate, PromoteError>
    where
        L: WorkerLauncher,
        C: Clock,
    {
        let key = manager.key();
        let mut failures = BatchResult::default();
        let mut failed_batches = 0;

        for batch in &descriptor.batches {
            let files = manager.batch_files(batch.batch_number);
            let result = match files.read_result() {
                Ok(Some(result)) => result,
                Ok(None) if batch.state == BatchState::Failed => {
                    // Never launched: every item is a failed promote
                    let failed_promotes = match files.read_items() {
                        Ok(items) => items.into_iter().map(|item| item.path).collect(),
                        Err(e) => {
                            tracing::warn!(job_key = %key, batch = batch.batch_number, error = %e, "failed batch has no readable item list");
                            Vec::new()
                        }
                    };
                    BatchResult { failed_promotes, ..BatchResult::default() }
                }
                Ok(None) => {
                    tracing::warn!(job_key = %key, batch = batch.batch_number, "batch result missing, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(job_key = %key, batch = batch.batch_number, error = %e, "batch result unreadable, skipping");
                    continue;
                }
            };

            if batch.state == BatchState::Failed
                || (batch.item_count > 0 && result.failed_promotes.len() >= batch.item_count)
            {
                failed_batches += 1;
            }
            failures.merge(result);
        }

        let outcome = if !descriptor.batches.is_empty() && failed_batches == descriptor.batches.len()
        {
            JobState::Failed
        } else if failed_batches == 0 && failures.is_empty() {
            JobState::Completed
        } else {
            JobState::CompletedWithError
        };
        let message = match outcome {
            JobState::Completed => SUCCESS_MESSAGE,
            _ => ERROR_MESSAGE,
        };

        let statuses = &manager.stores().statuses;
        statuses.update(
            key,
            &StatusPatch::status(outcome).with_message(message).clear_stage(Stage::PromoteCopy),
        );
        let (start, end) = statuses.start_end_time(key);
        let row = ReportRow::promote(start, end, failures.clone());

        manager.mark_complete(&failures)?;
        if manager.reported_row()?.is_some() {
            tracing::debug!(job_key = %key, "report row already appended");
        } else {
            let columns = row.columns();
            self.report
                .append_row(
                    &descriptor.metadata.params.project_excel_path,
                    &self.config.report_table,
                    &columns,
                )
                .await
                .map_err(|e| PromoteError::Network(format!("failed to append report row: {e}")))?;
            manager.record_reported_row(&columns)?;
        }

        tracing::info!(
            job_key = %key,
            outcome = %outcome,
            failures = failures.failure_count(),
            failed_batches,
            "promote finalized"
        );
        Ok(Aggregate { outcome, failures, row })
    }
}

#[cfg(test)]
#[path = "aggregator_tests.rs"]
mod tests;
