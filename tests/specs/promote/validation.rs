// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start rejects unusable parameters before planning anything.

use crate::prelude::*;

#[test]
fn admin_uri_without_site_fails_the_job() {
    let ws = Workspace::new();
    ws.stage("drafts/doc.docx", "x");
    ws.fgp()
        .args(&[
            "start", "--root", ROOT, "--admin-uri", "https://admin.example/tools", "--project",
            PROJECT,
        ])
        .fails_with(2)
        .stderr_has("admin_page_uri must carry owner, repo and ref");

    ws.fgp().args(&["status", "--job-key", ROOT]).passes().stdout_has("FAILED");
    assert!(!ws.state_path("activations").exists());
}

#[test]
fn missing_parameters_are_named() {
    let ws = Workspace::new();
    ws.fgp()
        .args(&["start", "--root", ROOT, "--admin-uri", "", "--project", ""])
        .fails_with(2)
        .stderr_has("missing required parameters: admin_page_uri, project_excel_path");
}

#[test]
fn bad_config_is_reported() {
    let ws = Workspace::new();
    std::fs::write(ws.path().join("fgp.toml"), "max_items_per_batch = 0\n").unwrap();
    ws.fgp()
        .args(&["status", "--job-key", ROOT])
        .fails_with(1)
        .stderr_has("max_items_per_batch must be at least 1");
}
