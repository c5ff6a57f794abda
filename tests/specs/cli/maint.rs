// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[test]
fn delete_refuses_whole_store() {
    let ws = Workspace::new();
    ws.fgp()
        .args(&["maint", "delete", "/"])
        .fails_with(2)
        .stderr_has("refusing to delete the whole store");
}

#[test]
fn read_missing_file_fails() {
    let ws = Workspace::new();
    ws.fgp().args(&["maint", "read", "nothing/here.json"]).fails_with(1).stderr_has("no such file");
}

#[test]
fn list_then_clear_instance() {
    let ws = Workspace::new();
    ws.start().stdout_has("Planned 0 items in 0 batches");

    let listed = ws.fgp().args(&["maint", "list"]).passes().stdout();
    let descriptor = listed.lines().next().expect("descriptor listed").to_string();
    assert!(descriptor.ends_with(".json"), "{listed}");
    ws.fgp().args(&["maint", "read", &descriptor]).passes().stdout_has("\"job_key\"");

    ws.fgp()
        .args(&["maint", "clear", "--job-key", ROOT, "--instance"])
        .passes()
        .stdout_has(&format!("Cleared status for {ROOT}"))
        .stdout_has("Removed 1 instance files");

    ws.fgp().args(&["status", "--job-key", ROOT]).fails_with(1);
    assert_eq!(ws.fgp().args(&["maint", "list"]).passes().stdout(), "");
}
