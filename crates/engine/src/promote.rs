// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point starting a promote job.

use crate::discovery::discover_items;
use crate::manager::BatchManager;
use crate::stores::Stores;
use fg_adapters::{ContentBackend, WorkerLauncher};
use fg_core::{
    ActivationId, Clock, JobKey, JobParams, JobState, PromoteConfig, PromoteError, StatusPatch,
};
use serde::Serialize;

/// What `start_promote` planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartSummary {
    pub job_key: JobKey,
    pub batches: usize,
    pub items: usize,
    /// Activation of batch 1, when it launched
    pub first_activation: Option<ActivationId>,
}

/// Validate `params`, discard any earlier run of the same job, plan the
/// staged items into batches and trigger batch 1.
///
/// The job key is the staging root. Invalid parameters mark the job FAILED;
/// any later failure marks it COMPLETED_WITH_ERROR. Both are returned.
pub async fn start_promote<L, B, C>(
    stores: Stores<C>,
    launcher: L,
    content: &B,
    config: &PromoteConfig,
    params: JobParams,
) -> Result<StartSummary, PromoteError>
where
    L: WorkerLauncher,
    B: ContentBackend,
    C: Clock,
{
    let key = JobKey::new(params.fg_root_folder.clone());
    if let Err(e) = params.validate() {
        tracing::error!(job_key = %key, error = %e, "invalid promote parameters");
        if !params.fg_root_folder.trim().is_empty() {
            stores
                .statuses
                .update(&key, &StatusPatch::status(JobState::Failed).with_message(e.to_string()));
        }
        return Err(e);
    }

    let mut manager = BatchManager::new(key.clone(), stores.clone(), launcher, config.clone());
    match plan_and_trigger(&mut manager, content, config, params).await {
        Ok(summary) => Ok(summary),
        Err(e) => {
            tracing::error!(job_key = %key, error = %e, "failed to start promote");
            stores.statuses.update(
                &key,
                &StatusPatch::status(JobState::CompletedWithError).with_message(e.to_string()),
            );
            Err(e)
        }
    }
}

async fn plan_and_trigger<L, B, C>(
    manager: &mut BatchManager<L, C>,
    content: &B,
    config: &PromoteConfig,
    params: JobParams,
) -> Result<StartSummary, PromoteError>
where
    L: WorkerLauncher,
    B: ContentBackend,
    C: Clock,
{
    let key = manager.key().clone();
    let statuses = manager.stores().statuses.clone();

    manager.cleanup_files()?;
    statuses.reset(&key).map_err(PromoteError::storage)?;
    statuses.update(
        &key,
        &StatusPatch::status(JobState::InProgress)
            .with_kind("promote")
            .with_message("Creating batches."),
    );

    let items = discover_items(content, &config.discovery_folders).await;
    let item_count = items.len();
    let batch_count = item_count.div_ceil(config.max_items_per_batch.max(1));
    manager.init(params)?;
    for item in items {
        manager.add_item(item)?;
    }
    statuses.update(
        &key,
        &StatusPatch::new()
            .with_message(format!("Created {batch_count} batches for {item_count} items.")),
    );

    let descriptor = manager.finalize_instance().await?;
    tracing::info!(job_key = %key, batches = batch_count, items = item_count, "promote started");
    Ok(StartSummary {
        job_key: key,
        batches: descriptor.batches.len(),
        items: descriptor.total_items(),
        first_activation: descriptor.batches.first().and_then(|b| b.activation_id.clone()),
    })
}

#[cfg(test)]
#[path = "promote_tests.rs"]
mod tests;
