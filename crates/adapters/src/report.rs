// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report sink: appends rows to a table of the project document.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Errors from report operations
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait ReportSink: Clone + Send + Sync + 'static {
    async fn append_row(
        &self,
        document: &str,
        table: &str,
        row: &[String],
    ) -> Result<(), ReportError>;
}

/// One JSON array per line in `<dir>/<document>.<table>.jsonl`.
#[derive(Clone, Debug)]
pub struct JsonlReportSink {
    dir: PathBuf,
}

impl JsonlReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing a document table; `/` in the document path becomes `_`.
    pub fn table_path(&self, document: &str, table: &str) -> PathBuf {
        let name = document.trim_start_matches('/').replace('/', "_");
        self.dir.join(format!("{name}.{table}.jsonl"))
    }
}

#[async_trait]
impl ReportSink for JsonlReportSink {
    async fn append_row(
        &self,
        document: &str,
        table: &str,
        row: &[String],
    ) -> Result<(), ReportError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut line = serde_json::to_string(row)?;
        line.push('\n');
        let path = self.table_path(document, table);
        let mut file =
            tokio::fs::OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        tracing::info!(document, table, path = %path.display(), "report row appended");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ReportError, ReportSink};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded row
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ReportCall {
        pub document: String,
        pub table: String,
        pub row: Vec<String>,
    }

    #[derive(Default)]
    struct FakeReportState {
        calls: Vec<ReportCall>,
        failing: bool,
    }

    /// Fake report sink for testing
    #[derive(Clone, Default)]
    pub struct FakeReportSink {
        inner: Arc<Mutex<FakeReportState>>,
    }

    impl FakeReportSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<ReportCall> {
            self.inner.lock().calls.clone()
        }

        pub fn set_failing(&self, failing: bool) {
            self.inner.lock().failing = failing;
        }
    }

    #[async_trait]
    impl ReportSink for FakeReportSink {
        async fn append_row(
            &self,
            document: &str,
            table: &str,
            row: &[String],
        ) -> Result<(), ReportError> {
            let mut inner = self.inner.lock();
            if inner.failing {
                return Err(ReportError::Io(std::io::Error::other("sink unavailable")));
            }
            inner.calls.push(ReportCall {
                document: document.to_string(),
                table: table.to_string(),
                row: row.to_vec(),
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeReportSink, ReportCall};

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
