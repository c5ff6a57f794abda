// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Resolve state directory: FG_STATE_DIR > XDG_STATE_HOME/fgp > ~/.local/state/fgp
pub fn state_dir() -> Result<PathBuf> {
    if let Some(dir) = non_empty("FG_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("fgp"));
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine a state directory"))?;
    Ok(home.join(".local/state/fgp"))
}

/// Config file used when `--config` is not given.
pub fn config_path() -> Option<PathBuf> {
    non_empty("FG_CONFIG").map(PathBuf::from)
}

/// Staging content root (default `<state>/staging`).
pub fn staging_root(state_dir: &std::path::Path) -> PathBuf {
    non_empty("FG_STAGING_ROOT").map(PathBuf::from).unwrap_or_else(|| state_dir.join("staging"))
}

/// Production content root (default `<state>/production`).
pub fn production_root(state_dir: &std::path::Path) -> PathBuf {
    non_empty("FG_PRODUCTION_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| state_dir.join("production"))
}

/// Address of the distribution network admin API.
pub fn admin_addr() -> String {
    non_empty("FG_ADMIN_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string())
}

/// Activation id handed to a launched worker.
pub fn activation_id() -> Option<String> {
    non_empty("FG_ACTIVATION_ID")
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
