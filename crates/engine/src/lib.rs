// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fg-engine: Batch orchestration for floodgate promotes
//!
//! A promote is planned into batches by [`BatchManager`], advanced one step
//! per external tick by [`Reconciler`], executed batch by batch by
//! [`PromoteWorker`], and summarized by [`ResultAggregator`]. The staging
//! tree itself is created and removed by [`TreeWorker`] jobs.

mod aggregator;
mod discovery;
mod maint;
mod manager;
mod planner;
mod promote;
mod reconciler;
mod retry;
mod stores;
mod tree;
mod worker;

pub use aggregator::{Aggregate, ResultAggregator};
pub use discovery::{discover_items, discover_production};
pub use maint::{Maintenance, StoredData};
pub use manager::{BatchFiles, BatchManager, TriggerOutcome};
pub use planner::{plan_batches, split_into_batches};
pub use promote::{start_promote, StartSummary};
pub use reconciler::{Reconciler, TickOutcome};
pub use retry::RetryPolicy;
pub use stores::Stores;
pub use tree::{start_tree_job, TreeJob, TreeOutcome, TreeStart, TreeWorker};
pub use worker::PromoteWorker;

#[cfg(test)]
mod test_helpers;
