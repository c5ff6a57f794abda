// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blob paths of one promote instance.
//!
//! ```text
//! instance/<digest>/descriptor.json
//! instance/<digest>/result.json
//! instance/<digest>/reported.json
//! instance/<digest>/batch_<n>/items.json
//! instance/<digest>/batch_<n>/result.json
//! ```
//!
//! `<digest>` is [`JobKey::digest`], so any job key is a safe path segment.

use fg_core::JobKey;

pub const INSTANCE_ROOT: &str = "instance";

pub fn instance_prefix(key: &JobKey) -> String {
    format!("{INSTANCE_ROOT}/{}", key.digest())
}

pub fn descriptor_path(key: &JobKey) -> String {
    format!("{}/descriptor.json", instance_prefix(key))
}

/// Job-level result written when the instance completes.
pub fn final_result_path(key: &JobKey) -> String {
    format!("{}/result.json", instance_prefix(key))
}

/// The report row, written once it has been appended to the sink.
pub fn reported_row_path(key: &JobKey) -> String {
    format!("{}/reported.json", instance_prefix(key))
}

pub fn batch_prefix(key: &JobKey, batch_number: u32) -> String {
    format!("{}/batch_{batch_number}", instance_prefix(key))
}

pub fn batch_items_path(key: &JobKey, batch_number: u32) -> String {
    format!("{}/items.json", batch_prefix(key, batch_number))
}

pub fn batch_result_path(key: &JobKey, batch_number: u32) -> String {
    format!("{}/result.json", batch_prefix(key, batch_number))
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
