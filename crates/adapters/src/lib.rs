// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fg-adapters: External collaborators of a promote job
//!
//! Each collaborator is a narrow async trait with a local implementation and
//! a fake (behind `test-support`) for engine tests.

pub mod content;
pub mod distribution;
mod http;
pub mod launcher;
pub mod report;

pub use content::{ContentBackend, ContentEntry, ContentError, FsContentBackend};
pub use distribution::{DistributionAdapter, DistributionError, DistributionOp, HttpDistribution};
pub use launcher::{LaunchError, ProcessLauncher, WorkerLauncher, WorkerRequest};
pub use report::{JsonlReportSink, ReportError, ReportSink};

#[cfg(any(test, feature = "test-support"))]
pub use content::FakeContentBackend;
#[cfg(any(test, feature = "test-support"))]
pub use distribution::{DistributionCall, FakeDistribution};
#[cfg(any(test, feature = "test-support"))]
pub use launcher::{FakeLauncher, LaunchCall};
#[cfg(any(test, feature = "test-support"))]
pub use report::{FakeReportSink, ReportCall};
