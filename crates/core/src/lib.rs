// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fg-core: Core types for floodgate promote batch orchestration

pub mod macros;

pub mod batch;
pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod instance;
pub mod item;
pub mod key;
pub mod result;
pub mod status;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use batch::{Batch, BatchState};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, JobParams, PromoteConfig, SiteRef};
pub use error::PromoteError;
pub use id::{short, ActivationId};
pub use instance::{InstanceDescriptor, RunMetadata};
pub use item::Item;
pub use key::JobKey;
pub use result::{BatchResult, ReportRow};
pub use status::{JobState, JobStatus, Stage, StatusPatch};
pub use time_fmt::{format_elapsed_ms, format_utc};
