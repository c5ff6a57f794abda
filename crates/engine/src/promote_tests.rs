// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::Harness;
use fg_core::test_support::TEST_ROOT;
use fg_core::BatchState;
use fg_storage::{layout, BlobStoreExt};

fn stage_drafts(h: &Harness, count: usize) {
    for i in 0..count {
        h.content.stage(&format!("/drafts/folder-{}/doc-{i}.docx", i % 3), b"content");
    }
}

async fn start(h: &Harness, params: JobParams) -> Result<StartSummary, PromoteError> {
    start_promote(h.stores.clone(), h.launcher.clone(), &h.content, &h.config, params).await
}

#[tokio::test]
async fn plans_discovered_items_and_triggers_batch_one() {
    let h = Harness::new();
    stage_drafts(&h, 45);

    let summary = start(&h, h.params()).await.unwrap();

    assert_eq!(summary.job_key, JobKey::new(TEST_ROOT));
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.items, 45);
    assert_eq!(summary.first_activation, Some(ActivationId::from_string("act-1")));
    assert_eq!(h.launcher.launched_batches(), vec![1]);

    let job = h.job_status();
    assert_eq!(job.kind.as_deref(), Some("promote"));
    assert_eq!(job.status, Some(JobState::InProgress));
    assert_eq!(job.message.as_deref(), Some("Created 3 batches for 45 items."));
}

#[tokio::test]
async fn restart_discards_previous_run() {
    let h = Harness::new();
    stage_drafts(&h, 45);
    start(&h, h.params()).await.unwrap();
    h.stores.statuses.update(&h.key, &StatusPatch::status(JobState::Completed));

    let stale_items = layout::batch_items_path(&h.key, 3);
    assert!(h.blobs.contains(&stale_items));
    h.content.stage("/drafts/extra.docx", b"x");
    let summary = start(&h, h.params()).await.unwrap();

    assert_eq!(summary.items, 46);
    assert_eq!(h.job_status().status, Some(JobState::InProgress));
    let descriptor = h.descriptor();
    assert_eq!(descriptor.batches[0].state, BatchState::Triggered);
    assert_eq!(descriptor.batches[1].state, BatchState::NotStarted);
    assert_eq!(descriptor.batches[0].activation_id, Some(ActivationId::from_string("act-2")));
}

#[tokio::test]
async fn invalid_params_fail_the_job() {
    let h = Harness::new();
    let params = JobParams { project_excel_path: String::new(), ..h.params() };

    let err = start(&h, params).await.unwrap_err();

    assert!(matches!(err, PromoteError::Validation(_)));
    let job = h.job_status();
    assert_eq!(job.status, Some(JobState::Failed));
    assert!(job.message.unwrap_or_default().contains("project_excel_path"));
    assert!(h.launcher.calls().is_empty());
}

#[tokio::test]
async fn missing_root_folder_writes_no_status() {
    let h = Harness::new();
    let params = JobParams { fg_root_folder: String::new(), ..h.params() };
    assert!(start(&h, params).await.is_err());
    assert!(h.kv.is_empty());
}

#[tokio::test]
async fn storage_failure_completes_with_error() {
    let h = Harness::new();
    stage_drafts(&h, 3);
    h.blobs.set_failing(true);

    let err = start(&h, h.params()).await.unwrap_err();

    assert!(matches!(err, PromoteError::Storage(_)));
    let job = h.job_status();
    assert_eq!(job.status, Some(JobState::CompletedWithError));
    assert_eq!(job.message, Some(err.to_string()));
}

#[tokio::test]
async fn nothing_staged_plans_empty_instance() {
    let h = Harness::new();
    let summary = start(&h, h.params()).await.unwrap();
    assert_eq!((summary.batches, summary.items), (0, 0));
    assert_eq!(summary.first_activation, None);
    let descriptor: Option<fg_core::InstanceDescriptor> =
        h.blobs.read_json(&layout::descriptor_path(&h.key)).unwrap();
    assert!(descriptor.is_some_and(|d| d.batches.is_empty()));
}

#[tokio::test]
async fn full_run_over_filesystem_stores() {
    use crate::{PromoteWorker, Reconciler, ResultAggregator, TickOutcome};
    use fg_adapters::{FakeContentBackend, FakeDistribution, FakeLauncher, FakeReportSink};
    use fg_core::test_support::test_params;
    use fg_core::FakeClock;
    use fg_storage::{FsBlobStore, FsKvStore};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    let dir = tempfile::tempdir().unwrap();
    let config =
        PromoteConfig::default().max_items_per_batch(10).group_delay_ms(0).retry_delay_ms(0);
    let clock = FakeClock::new();
    let stores = Stores::new(
        Arc::new(FsBlobStore::new(dir.path().join("files"))),
        Arc::new(FsKvStore::with_clock(dir.path().join("status"), clock.clone())),
        &config,
        clock,
    );
    let launcher = FakeLauncher::new();
    let content = FakeContentBackend::new();
    for i in 0..25 {
        content.stage(&format!("/drafts/doc-{i}.docx"), b"content");
    }

    let summary =
        start_promote(stores.clone(), launcher.clone(), &content, &config, test_params())
            .await
            .unwrap();
    assert_eq!(summary.batches, 3);

    let key = summary.job_key.clone();
    let worker = PromoteWorker::new(
        key.clone(),
        stores.clone(),
        content.clone(),
        FakeDistribution::new(),
        config.clone(),
    );
    let report = FakeReportSink::new();
    let reconciler = Reconciler::new(
        BatchManager::new(key.clone(), stores.clone(), launcher.clone(), config.clone()),
        ResultAggregator::new(report.clone(), config.clone()),
        config.clone(),
    );

    let mut ran = BTreeSet::new();
    let mut outcome = TickOutcome::Idle;
    for _ in 0..20 {
        for call in launcher.calls() {
            if ran.insert(call.request.batch_number) {
                worker.run(call.request.batch_number, &call.request.params).await.unwrap();
                launcher.finish(&call.activation_id);
            }
        }
        outcome = reconciler.tick().await;
        if matches!(outcome, TickOutcome::Completed(_)) {
            break;
        }
    }

    assert_eq!(outcome, TickOutcome::Completed(JobState::Completed));
    assert_eq!(launcher.launched_batches(), vec![1, 2, 3]);
    assert_eq!(content.uploaded_paths().len(), 25);
    assert_eq!(report.calls().len(), 1);
    let status = stores.statuses.read(&key).unwrap();
    assert_eq!(status.status, Some(JobState::Completed));
    assert!(status.end_time.is_some());
    assert!(dir.path().join("files").exists());
}
