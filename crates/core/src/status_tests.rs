// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::strategies::*;
use proptest::prelude::*;

#[yare::parameterized(
    started              = { JobState::Started, true },
    in_progress          = { JobState::InProgress, true },
    completed            = { JobState::Completed, false },
    completed_with_error = { JobState::CompletedWithError, false },
    failed               = { JobState::Failed, false },
)]
fn in_progress_states(state: JobState, expected: bool) {
    assert_eq!(state.is_in_progress(), expected);
    assert_eq!(state.is_terminal(), !expected);
}

#[yare::parameterized(
    started_to_progress   = { JobState::Started, JobState::InProgress, true },
    started_to_failed     = { JobState::Started, JobState::Failed, true },
    progress_to_completed = { JobState::InProgress, JobState::Completed, true },
    progress_to_failed    = { JobState::InProgress, JobState::Failed, true },
    progress_to_started   = { JobState::InProgress, JobState::Started, false },
    completed_to_failed   = { JobState::Completed, JobState::Failed, false },
    completed_to_progress = { JobState::Completed, JobState::InProgress, false },
    failed_to_failed      = { JobState::Failed, JobState::Failed, true },
)]
fn transitions(from: JobState, to: JobState, allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[test]
fn state_serializes_screaming_snake() {
    let json = serde_json::to_string(&JobState::CompletedWithError).unwrap();
    assert_eq!(json, "\"COMPLETED_WITH_ERROR\"");
    assert_eq!(JobState::InProgress.to_string(), "IN_PROGRESS");
}

#[test]
fn merge_keeps_activation_id_absent_from_patch() {
    let mut record = JobStatus {
        status: Some(JobState::InProgress),
        activation_id: Some(ActivationId::from_string("a1")),
        ..JobStatus::default()
    };

    assert!(record.merge(&StatusPatch::status(JobState::Completed), 5_000));

    assert_eq!(record.status, Some(JobState::Completed));
    assert_eq!(record.activation_id, Some(ActivationId::from_string("a1")));
}

#[test]
fn merge_sets_start_once_and_end_on_terminal() {
    let mut record = JobStatus::default();
    record.merge(&StatusPatch::status(JobState::Started), 100);
    record.merge(&StatusPatch::status(JobState::InProgress), 200);
    assert_eq!(record.start_end_time(), (Some(100), None));

    record.merge(&StatusPatch::status(JobState::CompletedWithError), 300);
    assert_eq!(record.start_end_time(), (Some(100), Some(300)));
}

#[test]
fn rewriting_same_terminal_state_keeps_end_time() {
    let mut record = JobStatus::default();
    record.merge(&StatusPatch::status(JobState::Completed), 300);
    assert!(record.merge(&StatusPatch::status(JobState::Completed), 900));
    assert_eq!(record.end_time, Some(300));
}

#[test]
fn merge_rejects_leaving_terminal_state_but_applies_other_fields() {
    let mut record = JobStatus::default();
    record.merge(&StatusPatch::status(JobState::Failed), 10);

    let accepted = record
        .merge(&StatusPatch::status(JobState::InProgress).with_message("retrying"), 20);

    assert!(!accepted);
    assert_eq!(record.status, Some(JobState::Failed));
    assert_eq!(record.message.as_deref(), Some("retrying"));
}

#[test]
fn stage_details_set_and_clear() {
    let mut record = JobStatus::default();
    record.merge(
        &StatusPatch::new()
            .with_stage(Stage::PromoteCopy, JobState::InProgress)
            .with_stage(Stage::PostPromote, JobState::Started),
        1,
    );
    record.merge(&StatusPatch::new().clear_stage(Stage::PromoteCopy), 2);

    assert_eq!(record.stage(Stage::PromoteCopy), None);
    assert_eq!(record.stage(Stage::PostPromote), Some(JobState::Started));
}

#[test]
fn record_serializes_type_field() {
    let record = JobStatus { kind: Some("promote".into()), ..JobStatus::default() };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value, serde_json::json!({ "type": "promote" }));
}

proptest! {
    #[test]
    fn merge_never_clears_present_fields(prior in arb_job_status(), patch in arb_status_patch()) {
        let mut merged = prior.clone();
        merged.merge(&patch, 1_000);

        if prior.kind.is_some() {
            prop_assert!(merged.kind.is_some());
        }
        if prior.message.is_some() {
            prop_assert!(merged.message.is_some());
        }
        if prior.activation_id.is_some() {
            prop_assert!(merged.activation_id.is_some());
        }
        if prior.status.is_some() {
            prop_assert!(merged.status.is_some());
        }
        if prior.start_time.is_some() {
            prop_assert_eq!(merged.start_time, prior.start_time);
        }
        if prior.end_time.is_some() {
            prop_assert!(merged.end_time.is_some());
        }
        for (stage, _) in &prior.stage_details {
            if !patch.stage_details.contains_key(stage) {
                prop_assert!(merged.stage_details.contains_key(stage));
            }
        }
    }

    #[test]
    fn merge_never_leaves_terminal_state(prior in arb_job_state(), next in arb_job_state()) {
        let mut record = JobStatus { status: Some(prior), ..JobStatus::default() };
        record.merge(&StatusPatch::status(next), 1);
        if prior.is_terminal() {
            prop_assert_eq!(record.status, Some(prior));
        }
    }
}
