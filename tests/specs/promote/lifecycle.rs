// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end promote runs with real worker processes.

use crate::prelude::*;

const REPORT: &str = "reports/fg-root_project.xlsx.PROMOTE_STATUS.jsonl";

fn report_rows(ws: &Workspace) -> Vec<Vec<String>> {
    std::fs::read_to_string(ws.state_path(REPORT))
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn batches_run_one_after_another_to_completion() {
    let ws = Workspace::new();
    for i in 0..5 {
        ws.stage(&format!("drafts/doc-{i}.docx"), &format!("body {i}"));
    }

    ws.start().stdout_has("Planned 5 items in 3 batches").stdout_has("Triggered batch 1");
    let done = ws.tick_until_complete();
    assert!(done.stdout().contains("completed: COMPLETED"), "{}", done.stdout());
    assert_eq!(done.code(), Some(0));

    for i in 0..5 {
        assert_eq!(ws.production_file(&format!("drafts/doc-{i}.docx")), Some(format!("body {i}")));
    }

    let status = ws.fgp().args(&["-o", "json", "status", "--job-key", ROOT]).passes().json();
    assert_eq!(status["status"]["status"], "COMPLETED");
    assert_eq!(status["status"]["message"], "Promoted floodgate tree successfully.");
    let states: Vec<&str> = status["batches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["DONE", "DONE", "DONE"]);

    let rows = report_rows(&ws);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "PROMOTE");
    assert!(rows[0][3..].iter().all(String::is_empty), "{rows:?}");

    // Ticks after completion change nothing.
    ws.fgp().args(&["tick", "--job-key", ROOT]).passes().stdout_has("completed: COMPLETED");
    assert_eq!(report_rows(&ws).len(), 1);
}

#[test]
fn locked_destination_completes_with_error() {
    let ws = Workspace::new();
    for i in 0..3 {
        ws.stage(&format!("drafts/doc-{i}.docx"), "body");
    }
    let locked = ws.path().join("production/drafts/doc-1.docx");
    std::fs::create_dir_all(locked.parent().unwrap()).unwrap();
    std::fs::write(&locked, "old").unwrap();
    let mut perms = std::fs::metadata(&locked).unwrap().permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(&locked, perms).unwrap();

    ws.start().stdout_has("Planned 3 items in 2 batches");
    let done = ws.tick_until_complete();
    assert!(done.stdout().contains("completed: COMPLETED_WITH_ERROR"), "{}", done.stdout());
    assert_eq!(done.code(), Some(3));

    assert_eq!(ws.production_file("drafts/doc-1.docx").as_deref(), Some("old"));
    assert_eq!(ws.production_file("drafts/doc-2.docx").as_deref(), Some("body"));
    let rows = report_rows(&ws);
    assert!(rows[0][3].contains("/drafts/doc-1.docx"), "{rows:?}");

    ws.fgp().args(&["status", "--job-key", ROOT]).passes().stdout_has("Check project excel sheet");
}

#[test]
fn empty_tree_completes_without_workers() {
    let ws = Workspace::new();
    ws.start().stdout_has("Planned 0 items in 0 batches");
    ws.fgp().args(&["tick", "--job-key", ROOT]).passes().stdout_has("completed: COMPLETED");
    assert!(!ws.state_path("activations").exists());
}
