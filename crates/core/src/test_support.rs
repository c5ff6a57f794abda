// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::batch::Batch;
use crate::config::JobParams;
use crate::instance::{InstanceDescriptor, RunMetadata};
use crate::item::Item;
use crate::key::JobKey;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for status records and item lists.
pub mod strategies {
    use crate::id::ActivationId;
    use crate::item::Item;
    use crate::status::{JobState, JobStatus, Stage, StatusPatch};
    use proptest::collection::{btree_map, vec};
    use proptest::prelude::*;

    pub fn arb_job_state() -> impl Strategy<Value = JobState> {
        prop_oneof![
            Just(JobState::Started),
            Just(JobState::InProgress),
            Just(JobState::Completed),
            Just(JobState::CompletedWithError),
            Just(JobState::Failed),
        ]
    }

    pub fn arb_stage() -> impl Strategy<Value = Stage> {
        prop_oneof![Just(Stage::PromoteCopy), Just(Stage::PostPromote)]
    }

    fn arb_activation_id() -> impl Strategy<Value = ActivationId> {
        "[a-z0-9]{4,8}".prop_map(|s| ActivationId::from_string(format!("act-{s}")))
    }

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        (
            proptest::option::of("[a-z]{1,8}"),
            proptest::option::of(arb_job_state()),
            proptest::option::of("[a-z ]{0,16}"),
            proptest::option::of(arb_activation_id()),
            proptest::option::of(0u64..1_000),
            proptest::option::of(0u64..1_000),
            btree_map(arb_stage(), arb_job_state(), 0..=2),
        )
            .prop_map(|(kind, status, message, activation_id, start_time, end_time, stage_details)| {
                JobStatus {
                    kind,
                    status,
                    message,
                    activation_id,
                    start_time,
                    end_time,
                    stage_details,
                }
            })
    }

    pub fn arb_status_patch() -> impl Strategy<Value = StatusPatch> {
        (
            proptest::option::of("[a-z]{1,8}"),
            proptest::option::of(arb_job_state()),
            proptest::option::of("[a-z ]{0,16}"),
            proptest::option::of(arb_activation_id()),
            btree_map(arb_stage(), proptest::option::of(arb_job_state()), 0..=2),
        )
            .prop_map(|(kind, status, message, activation_id, stage_details)| StatusPatch {
                kind,
                status,
                message,
                activation_id,
                stage_details,
            })
    }

    /// Item lists with unique paths.
    pub fn arb_items(max: usize) -> impl Strategy<Value = Vec<Item>> {
        vec("[a-z]{1,6}", 0..=max).prop_map(|names| {
            names
                .into_iter()
                .enumerate()
                .map(|(i, name)| {
                    let path = format!("/{name}-{i}.docx");
                    Item::new(path.clone(), format!("/staging{path}"))
                })
                .collect()
        })
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

pub const TEST_ROOT: &str = "/fg-root";

pub fn test_params() -> JobParams {
    JobParams {
        fg_root_folder: TEST_ROOT.to_string(),
        admin_page_uri: "https://admin.example/tools/floodgate?ref=main&repo=site&owner=acme"
            .to_string(),
        project_excel_path: "/drafts/project.xlsx".to_string(),
        do_publish: true,
    }
}

/// `count` items named `/doc-<n>.docx` staged under `/staging`.
pub fn test_items(count: usize) -> Vec<Item> {
    (0..count)
        .map(|i| {
            let path = format!("/doc-{i}.docx");
            Item::new(path.clone(), format!("/staging{path}"))
        })
        .collect()
}

/// Descriptor with one NOT_STARTED batch per entry of `sizes`.
pub fn test_descriptor(sizes: &[usize]) -> InstanceDescriptor {
    let metadata = RunMetadata {
        params: test_params(),
        batch_size: sizes.iter().copied().max().unwrap_or(1),
        created_at: 1_000_000,
    };
    let mut descriptor = InstanceDescriptor::new(JobKey::new(TEST_ROOT), metadata);
    descriptor.batches = sizes
        .iter()
        .enumerate()
        .map(|(i, size)| Batch::new(i as u32 + 1, *size))
        .collect();
    descriptor
}
