// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fgp copy`: production documents land in the staging tree.

use crate::prelude::*;

fn copy_key() -> String {
    format!("copy~{ROOT}{PROJECT}")
}

fn copy(ws: &Workspace) -> RunAssert {
    ws.fgp().args(&["copy", "--root", ROOT, "--admin-uri", ADMIN_URI, "--project", PROJECT]).passes()
}

#[test]
fn copies_configured_folders_into_staging() {
    let ws = Workspace::new();
    ws.publish("drafts/a.docx", "alpha");
    ws.publish("drafts/deep/b.xlsx", "beta");
    ws.publish("live/untouched.docx", "x");

    copy(&ws).stdout_has(&format!("Triggered copy for {}", copy_key()));

    assert_eq!(ws.wait_for_terminal(&copy_key()), "COMPLETED");
    assert_eq!(ws.staged_file("drafts/a.docx").as_deref(), Some("alpha"));
    assert_eq!(ws.staged_file("drafts/deep/b.xlsx").as_deref(), Some("beta"));
    assert_eq!(ws.staged_file("live/untouched.docx"), None);

    let report = std::fs::read_to_string(ws.state_path("reports/fg-root_project.xlsx.COPY_STATUS.jsonl"))
        .expect("copy report written");
    assert_eq!(report.lines().count(), 1);
    assert!(report.starts_with("[\"COPY\""), "{report}");
}

#[test]
fn status_shows_copy_kind() {
    let ws = Workspace::new();
    ws.publish("drafts/a.docx", "alpha");
    copy(&ws);
    ws.wait_for_terminal(&copy_key());

    let json = ws.fgp().args(&["-o", "json", "status", "--job-key", &copy_key()]).passes().json();
    assert_eq!(json["status"]["type"], "copy");
    assert_eq!(json["status"]["message"], "All tasks for Floodgate Copy completed");
}

#[test]
fn rejects_admin_uri_without_site() {
    let ws = Workspace::new();
    ws.fgp()
        .args(&["copy", "--root", ROOT, "--admin-uri", "https://admin.example/", "--project", PROJECT])
        .fails_with(2)
        .stderr_has("admin_page_uri");
}
