// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-distribution network: preview and publish.

use crate::http;
use async_trait::async_trait;
use fg_core::config::SiteRef;
use std::time::Duration;
use thiserror::Error;

/// Errors from distribution calls
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("{op} {path} returned {status}")]
    Rejected { op: DistributionOp, path: String, status: u16 },
    #[error("request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionOp {
    Preview,
    Publish,
}

fg_core::simple_display! {
    DistributionOp {
        Preview => "preview",
        Publish => "live",
    }
}

#[async_trait]
pub trait DistributionAdapter: Clone + Send + Sync + 'static {
    /// Trigger `op` for a public path of `site`. One attempt; callers retry.
    async fn trigger(
        &self,
        op: DistributionOp,
        site: &SiteRef,
        path: &str,
    ) -> Result<(), DistributionError>;
}

/// Admin endpoint reached over plain HTTP.
#[derive(Clone, Debug)]
pub struct HttpDistribution {
    addr: String,
    timeout: Duration,
}

impl HttpDistribution {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), timeout: Duration::from_secs(30) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Admin API path: `/<op>/<owner>/<repo>/<branch><path>`.
pub fn request_path(op: DistributionOp, site: &SiteRef, path: &str) -> String {
    format!("/{}/{}/{}/{}{}", op, site.owner, site.repo, site.branch, path)
}

#[async_trait]
impl DistributionAdapter for HttpDistribution {
    async fn trigger(
        &self,
        op: DistributionOp,
        site: &SiteRef,
        path: &str,
    ) -> Result<(), DistributionError> {
        let response = http::post(&self.addr, &request_path(op, site, path), self.timeout)
            .await
            .map_err(DistributionError::Request)?;
        if response.is_success() {
            tracing::debug!(%op, path, status = response.status, "distribution accepted");
            Ok(())
        } else {
            Err(DistributionError::Rejected { op, path: path.to_string(), status: response.status })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{DistributionAdapter, DistributionError, DistributionOp};
    use async_trait::async_trait;
    use fg_core::config::SiteRef;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Recorded call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DistributionCall {
        pub op: DistributionOp,
        pub path: String,
    }

    #[derive(Default)]
    struct FakeDistributionState {
        calls: Vec<DistributionCall>,
        rejected: HashSet<(DistributionOp, String)>,
    }

    /// Fake distribution for testing; accepts everything unless told otherwise.
    #[derive(Clone, Default)]
    pub struct FakeDistribution {
        inner: Arc<Mutex<FakeDistributionState>>,
    }

    impl FakeDistribution {
        pub fn new() -> Self {
            Self::default()
        }

        /// Always reject `op` for `path`.
        pub fn reject(&self, op: DistributionOp, path: &str) {
            self.inner.lock().rejected.insert((op, path.to_string()));
        }

        pub fn calls(&self) -> Vec<DistributionCall> {
            self.inner.lock().calls.clone()
        }

        pub fn paths(&self, op: DistributionOp) -> Vec<String> {
            self.inner.lock().calls.iter().filter(|c| c.op == op).map(|c| c.path.clone()).collect()
        }
    }

    #[async_trait]
    impl DistributionAdapter for FakeDistribution {
        async fn trigger(
            &self,
            op: DistributionOp,
            _site: &SiteRef,
            path: &str,
        ) -> Result<(), DistributionError> {
            let mut inner = self.inner.lock();
            inner.calls.push(DistributionCall { op, path: path.to_string() });
            if inner.rejected.contains(&(op, path.to_string())) {
                return Err(DistributionError::Rejected { op, path: path.to_string(), status: 500 });
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{DistributionCall, FakeDistribution};

#[cfg(test)]
#[path = "distribution_tests.rs"]
mod tests;
