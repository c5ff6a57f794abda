// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic batch planning.

use fg_core::{Batch, InstanceDescriptor, Item, JobKey, PromoteError, RunMetadata};
use fg_storage::{layout, BlobStore, BlobStoreExt};

/// Split `items` into consecutive batches of at most `max_items_per_batch`,
/// preserving order. Batch `i` is `items[i*size .. (i+1)*size]`.
pub fn split_into_batches(items: &[Item], max_items_per_batch: usize) -> Vec<Vec<Item>> {
    items.chunks(max_items_per_batch.max(1)).map(<[Item]>::to_vec).collect()
}

/// Persist one batch's item list.
pub(crate) fn write_batch_items(
    blobs: &dyn BlobStore,
    key: &JobKey,
    batch_number: u32,
    items: &[Item],
) -> Result<(), PromoteError> {
    blobs
        .write_json(&layout::batch_items_path(key, batch_number), &items)
        .map_err(PromoteError::storage)?;
    tracing::debug!(job_key = %key, batch = batch_number, items = items.len(), "batch items written");
    Ok(())
}

/// Plan `items` into batches, persisting every item list and then a
/// descriptor with all batches NOT_STARTED.
///
/// A failed write aborts planning; the partial plan is left in place and is
/// not safe to resume (start over after `cleanup_files`).
pub fn plan_batches(
    blobs: &dyn BlobStore,
    key: &JobKey,
    metadata: RunMetadata,
    items: &[Item],
) -> Result<InstanceDescriptor, PromoteError> {
    let mut descriptor = InstanceDescriptor::new(key.clone(), metadata);
    for (i, chunk) in split_into_batches(items, descriptor.metadata.batch_size).iter().enumerate() {
        let batch_number = i as u32 + 1;
        write_batch_items(blobs, key, batch_number, chunk)?;
        descriptor.batches.push(Batch::new(batch_number, chunk.len()));
    }
    blobs
        .write_json(&layout::descriptor_path(key), &descriptor)
        .map_err(PromoteError::storage)?;
    tracing::info!(
        job_key = %key,
        batches = descriptor.batches.len(),
        items = items.len(),
        "instance planned"
    );
    Ok(descriptor)
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
