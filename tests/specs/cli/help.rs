// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and usage output.

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("start")
        .stdout_has("tick")
        .stdout_has("worker")
        .stdout_has("status")
        .stdout_has("copy")
        .stdout_has("delete")
        .stdout_has("maint");
}

#[test]
fn no_args_prints_usage_and_fails() {
    cli().fails_with(2).stderr_has("Usage:");
}

#[test]
fn maint_help_lists_subcommands() {
    cli()
        .args(&["maint", "--help"])
        .passes()
        .stdout_has("list")
        .stdout_has("read")
        .stdout_has("delete")
        .stdout_has("clear");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
