// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use fg_core::{format_elapsed_ms, format_utc, JobStatus};
use serde::Serialize;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Label/value rows describing a status record, in display order.
///
/// Absent fields are omitted. Elapsed time runs to `now_ms` while the job has
/// no end time.
pub fn status_rows(status: &JobStatus, now_ms: u64) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    if let Some(state) = status.status {
        rows.push(("status", state.to_string()));
    }
    if let Some(kind) = &status.kind {
        rows.push(("type", kind.clone()));
    }
    if let Some(message) = &status.message {
        rows.push(("message", message.clone()));
    }
    if let Some(activation) = &status.activation_id {
        rows.push(("activation", activation.to_string()));
    }
    if status.start_time.is_some() {
        rows.push(("started", format_utc(status.start_time)));
    }
    if status.end_time.is_some() {
        rows.push(("ended", format_utc(status.end_time)));
    }
    if let Some(start) = status.start_time {
        let end = status.end_time.unwrap_or(now_ms);
        rows.push(("elapsed", format_elapsed_ms(end.saturating_sub(start))));
    }
    if !status.stage_details.is_empty() {
        let stages: Vec<String> =
            status.stage_details.iter().map(|(stage, state)| format!("{stage}={state}")).collect();
        rows.push(("stages", stages.join(" ")));
    }
    rows
}

/// Print a status record under a header line.
pub fn print_status(title: &str, status: &JobStatus, now_ms: u64) {
    println!("{}", crate::color::header(title));
    for (label, value) in status_rows(status, now_ms) {
        let value = match (label, status.status) {
            ("status", Some(state)) => crate::color::state(state),
            _ => value,
        };
        println!("  {} {}", crate::color::context(&format!("{label:<11}")), value);
    }
}
