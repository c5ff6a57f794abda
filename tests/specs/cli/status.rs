// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[test]
fn unknown_job_has_no_status() {
    let ws = Workspace::new();
    ws.fgp()
        .args(&["status", "--job-key", "/nope"])
        .fails_with(1)
        .stderr_has("no status recorded for /nope");
}

#[test]
fn planned_empty_job_reports_status() {
    let ws = Workspace::new();
    ws.start();

    let status = ws.fgp().args(&["-o", "json", "status", "--job-key", ROOT]).passes().json();
    assert_eq!(status["job_key"], ROOT);
    assert_eq!(status["status"]["type"], "promote");
    assert_eq!(status["batches"].as_array().map(Vec::len), Some(0));
    ws.fgp().args(&["status", "--job-key", ROOT]).passes().stdout_has(ROOT).stdout_has("status");
}
