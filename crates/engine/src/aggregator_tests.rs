// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::planner::plan_batches;
use crate::test_helpers::Harness;
use fg_core::test_support::test_items;
use fg_core::RunMetadata;
use fg_storage::layout;

fn failed(paths: &[&str]) -> BatchResult {
    BatchResult {
        failed_promotes: paths.iter().map(|p| p.to_string()).collect(),
        ..BatchResult::default()
    }
}

/// `count` batches of `size` items each, all settled as DONE.
fn settled(h: &Harness, size: usize, count: usize) -> InstanceDescriptor {
    let metadata = RunMetadata { params: h.params(), batch_size: size, created_at: 0 };
    let mut descriptor =
        plan_batches(h.blobs.as_ref(), &h.key, metadata, &test_items(size * count)).unwrap();
    for batch in &mut descriptor.batches {
        batch.state = BatchState::Done;
    }
    descriptor
}

#[tokio::test]
async fn merges_results_in_batch_order() {
    let h = Harness::new();
    let descriptor = settled(&h, 20, 2);
    let manager = h.manager();
    manager.batch_files(1).write_result(&failed(&["/doc-3.docx"])).unwrap();
    manager
        .batch_files(2)
        .write_result(&BatchResult {
            failed_promotes: vec!["/doc-25.docx (locked)".into()],
            failed_previews: vec!["/doc-30".into()],
            failed_publishes: vec!["/doc-31".into()],
        })
        .unwrap();

    let aggregate = h.aggregator().finalize(&manager, &descriptor).await.unwrap();

    assert_eq!(aggregate.outcome, JobState::CompletedWithError);
    assert_eq!(aggregate.failures.failed_promotes, vec!["/doc-3.docx", "/doc-25.docx (locked)"]);
    let columns = aggregate.row.columns();
    assert_eq!(columns[3], "/doc-3.docx\n/doc-25.docx (locked)");
    assert_eq!(columns[4], "/doc-30");
    assert_eq!(columns[5], "/doc-31");
    assert_eq!(h.report.calls()[0].row, columns);
    assert_eq!(manager.read_final_result().unwrap(), Some(aggregate.failures));
}

#[tokio::test]
async fn missing_and_corrupt_results_are_skipped() {
    let h = Harness::new();
    let descriptor = settled(&h, 20, 3);
    let manager = h.manager();
    h.blobs.put_raw(&layout::batch_result_path(&h.key, 2), b"{not json");
    manager.batch_files(3).write_result(&BatchResult::default()).unwrap();

    let aggregate = h.aggregator().finalize(&manager, &descriptor).await.unwrap();
    assert_eq!(aggregate.outcome, JobState::Completed);
    assert!(aggregate.failures.is_empty());
}

#[tokio::test]
async fn never_launched_batch_lists_its_items() {
    let h = Harness::new();
    let mut descriptor = settled(&h, 2, 2);
    descriptor.batches[0].state = BatchState::Failed;
    let manager = h.manager();
    manager.batch_files(2).write_result(&BatchResult::default()).unwrap();

    let aggregate = h.aggregator().finalize(&manager, &descriptor).await.unwrap();
    assert_eq!(aggregate.outcome, JobState::CompletedWithError);
    assert_eq!(aggregate.failures, failed(&["/doc-0.docx", "/doc-1.docx"]));
}

#[yare::parameterized(
    none_failed   = { &[0, 0], JobState::Completed },
    partial       = { &[1, 0], JobState::CompletedWithError },
    one_whole     = { &[2, 0], JobState::CompletedWithError },
    all_whole     = { &[2, 2], JobState::Failed },
)]
fn classifies_outcome(failures_per_batch: &[usize], expected: JobState) {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    rt.block_on(async {
        let h = Harness::new();
        let descriptor = settled(&h, 2, failures_per_batch.len());
        let manager = h.manager();
        for (i, count) in failures_per_batch.iter().enumerate() {
            let first = i * 2;
            let paths: Vec<String> = (first..first + count).map(|n| format!("/doc-{n}.docx")).collect();
            let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
            manager.batch_files(i as u32 + 1).write_result(&failed(&refs)).unwrap();
        }
        let aggregate = h.aggregator().finalize(&manager, &descriptor).await.unwrap();
        assert_eq!(aggregate.outcome, expected);
    });
}

#[tokio::test]
async fn finalize_twice_is_identical() {
    let h = Harness::new();
    let descriptor = settled(&h, 20, 2);
    let manager = h.manager();
    manager.batch_files(1).write_result(&failed(&["/doc-1.docx"])).unwrap();
    manager.batch_files(2).write_result(&BatchResult::default()).unwrap();
    let aggregator = h.aggregator();

    let first = aggregator.finalize(&manager, &descriptor).await.unwrap();
    h.clock.advance(std::time::Duration::from_secs(60));
    let second = aggregator.finalize(&manager, &descriptor).await.unwrap();

    assert_eq!(first, second);
    let job = h.job_status();
    assert_eq!(job.status, Some(JobState::CompletedWithError));
    assert_eq!(job.message.as_deref(), Some(ERROR_MESSAGE));
    assert_eq!(h.report.calls().len(), 1);
    assert_eq!(manager.reported_row().unwrap(), Some(first.row.columns()));
}

#[tokio::test]
async fn sink_failure_is_a_network_error() {
    let h = Harness::new();
    let descriptor = settled(&h, 5, 1);
    let manager = h.manager();
    h.report.set_failing(true);

    let err = h.aggregator().finalize(&manager, &descriptor).await.unwrap_err();
    assert!(matches!(err, PromoteError::Network(_)));
    assert_eq!(manager.reported_row().unwrap(), None);
}

#[tokio::test]
async fn retry_after_sink_failure_appends_row_once() {
    let h = Harness::new();
    let descriptor = settled(&h, 5, 1);
    let manager = h.manager();
    manager.batch_files(1).write_result(&BatchResult::default()).unwrap();
    let aggregator = h.aggregator();

    h.report.set_failing(true);
    assert!(aggregator.finalize(&manager, &descriptor).await.is_err());
    assert_eq!(manager.read_final_result().unwrap(), Some(BatchResult::default()));

    h.report.set_failing(false);
    aggregator.finalize(&manager, &descriptor).await.unwrap();
    aggregator.finalize(&manager, &descriptor).await.unwrap();
    assert_eq!(h.report.calls().len(), 1);
}

#[tokio::test]
async fn result_store_failure_appends_nothing() {
    let h = Harness::new();
    let descriptor = settled(&h, 5, 1);
    let manager = h.manager();
    manager.batch_files(1).write_result(&BatchResult::default()).unwrap();
    h.blobs.set_failing(true);

    let err = h.aggregator().finalize(&manager, &descriptor).await.unwrap_err();
    assert!(matches!(err, PromoteError::Storage(_)));
    assert!(h.report.calls().is_empty());
}
