// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fgp delete`: the staged folders are emptied.

use crate::prelude::*;

fn delete_key() -> String {
    format!("delete~{ROOT}{PROJECT}")
}

#[test]
fn empties_staged_folders() {
    let ws = Workspace::new();
    ws.stage("drafts/a.docx", "alpha");
    ws.stage("drafts/deep/b.docx", "beta");
    ws.stage("outside/c.docx", "gamma");

    ws.fgp()
        .args(&["delete", "--root", ROOT, "--admin-uri", ADMIN_URI, "--project", PROJECT])
        .passes()
        .stdout_has("Triggered delete");

    assert_eq!(ws.wait_for_terminal(&delete_key()), "COMPLETED");
    assert_eq!(ws.staged_file("drafts/a.docx"), None);
    assert_eq!(ws.staged_file("drafts/deep/b.docx"), None);
    assert_eq!(ws.staged_file("outside/c.docx").as_deref(), Some("gamma"));
    assert!(ws.path().join("staging/drafts").is_dir());
}

#[test]
fn copy_then_delete_round_trip() {
    let ws = Workspace::new();
    ws.publish("drafts/a.docx", "alpha");
    let args = ["--root", ROOT, "--admin-uri", ADMIN_URI, "--project", PROJECT];

    ws.fgp().args(&["copy"]).args(&args).passes();
    assert_eq!(ws.wait_for_terminal(&format!("copy~{ROOT}{PROJECT}")), "COMPLETED");
    assert!(ws.staged_file("drafts/a.docx").is_some());

    ws.fgp().args(&["delete"]).args(&args).passes();
    assert_eq!(ws.wait_for_terminal(&delete_key()), "COMPLETED");
    assert_eq!(ws.staged_file("drafts/a.docx"), None);
    assert_eq!(ws.production_file("drafts/a.docx").as_deref(), Some("alpha"));
}
