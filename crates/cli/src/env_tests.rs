// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::path::Path;

fn clear() {
    for name in ["FG_STATE_DIR", "XDG_STATE_HOME", "FG_STAGING_ROOT", "FG_PRODUCTION_ROOT"] {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn state_dir_prefers_explicit_override() {
    clear();
    std::env::set_var("FG_STATE_DIR", "/tmp/fgp-state");
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/fgp-state"));
    clear();
}

#[test]
#[serial]
fn state_dir_falls_back_to_xdg() {
    clear();
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/xdg/fgp"));
    clear();
}

#[test]
#[serial]
fn empty_override_is_ignored() {
    clear();
    std::env::set_var("FG_STATE_DIR", "");
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/xdg/fgp"));
    clear();
}

#[test]
#[serial]
fn content_roots_default_under_state_dir() {
    clear();
    let state = Path::new("/tmp/state");
    assert_eq!(staging_root(state), PathBuf::from("/tmp/state/staging"));
    assert_eq!(production_root(state), PathBuf::from("/tmp/state/production"));

    std::env::set_var("FG_STAGING_ROOT", "/srv/staging");
    assert_eq!(staging_root(state), PathBuf::from("/srv/staging"));
    clear();
}
