// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.
//!
//! Interactive commands log to stderr. Workers run detached with their
//! stdio closed, so each batch logs to its own file under `<state>/logs/`.

use std::path::Path;

use fg_core::{short, JobKey};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to stderr. A second call is a no-op.
pub fn init_stderr() {
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

/// Log to `<state_dir>/logs/<job digest>-batch_<n>.log`.
///
/// The returned guard flushes buffered lines when dropped; hold it for the
/// lifetime of the worker.
pub fn init_worker(state_dir: &Path, key: &JobKey, batch_number: u32) -> anyhow::Result<WorkerGuard> {
    let logs_dir = state_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)?;
    let file_name = worker_log_name(key, batch_number);
    let appender = tracing_appender::rolling::never(logs_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init();
    Ok(guard)
}

fn worker_log_name(key: &JobKey, batch_number: u32) -> String {
    format!("{}-batch_{batch_number}.log", short(&key.digest(), 12))
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
