// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable timestamps for reports and status output.

use chrono::{TimeZone, Utc};

/// Format epoch ms as an HTTP-style UTC date; empty when absent.
pub fn format_utc(epoch_ms: Option<u64>) -> String {
    let Some(ms) = epoch_ms else {
        return String::new();
    };
    let Ok(ms) = i64::try_from(ms) else {
        return String::new();
    };
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        None => String::new(),
    }
}

/// Format a duration in ms as a compact "1h 2m" / "3m 4s" / "5s" string.
pub fn format_elapsed_ms(ms: u64) -> String {
    let secs = ms / 1000;
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
