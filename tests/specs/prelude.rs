// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures: an isolated state directory, staging and production
//! trees, and a fluent wrapper around the `fgp` binary.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;

pub const ROOT: &str = "/fg-root";
pub const ADMIN_URI: &str = "https://admin.example/tools?project=demo&owner=acme&repo=site&ref=main";
pub const PROJECT: &str = "/fg-root/project.xlsx";

const CONFIG: &str = r#"
max_items_per_batch = 2
group_delay_ms = 0
retry_delay_ms = 0
max_retries = 1
preview_enabled = false
"#;

/// `fgp` with no workspace, for commands that touch no state.
pub fn cli() -> CliBuilder {
    CliBuilder::new(Command::cargo_bin("fgp").expect("fgp binary"))
}

/// Isolated stores and content trees for one spec.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for sub in ["state", "staging/drafts", "production"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        std::fs::write(dir.path().join("fgp.toml"), CONFIG).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a staging file; `rel` is relative to the staging root.
    pub fn stage(&self, rel: &str, content: &str) {
        let path = self.path().join("staging").join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Write a production file; `rel` is relative to the production root.
    pub fn publish(&self, rel: &str, content: &str) {
        let path = self.path().join("production").join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn staged_file(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.path().join("staging").join(rel)).ok()
    }

    pub fn production_file(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.path().join("production").join(rel)).ok()
    }

    pub fn state_path(&self, rel: &str) -> PathBuf {
        self.path().join("state").join(rel)
    }

    pub fn fgp(&self) -> CliBuilder {
        let mut cmd = Command::cargo_bin("fgp").expect("fgp binary");
        cmd.env("FG_STATE_DIR", self.path().join("state"))
            .env("FG_STAGING_ROOT", self.path().join("staging"))
            .env("FG_PRODUCTION_ROOT", self.path().join("production"))
            .env("FG_CONFIG", self.path().join("fgp.toml"))
            .env("FG_ADMIN_ADDR", "127.0.0.1:9")
            .env("NO_COLOR", "1")
            .env_remove("COLOR");
        CliBuilder::new(cmd)
    }

    pub fn start(&self) -> RunAssert {
        self.fgp()
            .args(&["start", "--root", ROOT, "--admin-uri", ADMIN_URI, "--project", PROJECT])
            .passes()
    }

    /// Poll the status record of `key` until it leaves STARTED/IN_PROGRESS;
    /// returns the final state.
    pub fn wait_for_terminal(&self, key: &str) -> String {
        for _ in 0..200 {
            let run = self.fgp().args(&["-o", "json", "status", "--job-key", key]).run();
            if run.code() == Some(0) {
                let state = run.json()["status"]["status"].as_str().unwrap_or_default().to_string();
                if !state.is_empty() && state != "STARTED" && state != "IN_PROGRESS" {
                    return state;
                }
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        panic!("job {key} did not finish");
    }

    /// Tick until the job completes; returns the final tick's stdout.
    pub fn tick_until_complete(&self) -> RunAssert {
        for _ in 0..200 {
            let run = self.fgp().args(&["tick", "--job-key", ROOT]).run();
            if run.stdout().contains("completed:") {
                return run;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        panic!("job {ROOT} did not complete");
    }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    fn new(cmd: Command) -> Self {
        Self { cmd }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn run(mut self) -> RunAssert {
        RunAssert { output: self.cmd.output().expect("run fgp") }
    }

    pub fn passes(self) -> RunAssert {
        let run = self.run();
        assert!(run.output.status.success(), "expected success\n{}", run.describe());
        run
    }

    pub fn fails_with(self, code: i32) -> RunAssert {
        let run = self.run();
        assert_eq!(run.output.status.code(), Some(code), "unexpected exit\n{}", run.describe());
        run
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.output.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e})\n{}", self.describe()))
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout().contains(needle), "stdout lacks {needle:?}\n{}", self.describe());
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr().contains(needle), "stderr lacks {needle:?}\n{}", self.describe());
        self
    }

    fn describe(&self) -> String {
        format!("status: {}\nstdout:\n{}\nstderr:\n{}", self.output.status, self.stdout(), self.stderr())
    }
}
