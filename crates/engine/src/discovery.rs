// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fg_adapters::{ContentBackend, ContentEntry, ContentError};
use fg_core::Item;
use std::collections::VecDeque;
use std::future::Future;

/// Walk the staging tree breadth-first from `folders`, collecting files.
///
/// A folder that cannot be listed is logged and skipped.
pub async fn discover_items<B: ContentBackend>(backend: &B, folders: &[String]) -> Vec<Item> {
    let items = walk(folders, |folder| async move { backend.list_children(&folder).await }).await;
    tracing::info!(items = items.len(), "discovery finished");
    items
}

/// Same walk over the production tree.
pub async fn discover_production<B: ContentBackend>(backend: &B, folders: &[String]) -> Vec<Item> {
    let items = walk(folders, |folder| async move { backend.list_production(&folder).await }).await;
    tracing::info!(items = items.len(), "production discovery finished");
    items
}

async fn walk<F, Fut>(folders: &[String], list: F) -> Vec<Item>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<ContentEntry>, ContentError>>,
{
    let mut queue: VecDeque<String> = folders.iter().cloned().collect();
    let mut items = Vec::new();
    while let Some(folder) = queue.pop_front() {
        match list(folder.clone()).await {
            Ok(children) => {
                for child in children {
                    if child.is_folder {
                        queue.push_back(child.path);
                    } else {
                        items.push(Item::new(child.path, child.locator));
                    }
                }
            }
            Err(e) => tracing::warn!(folder = %folder, error = %e, "failed to list folder, skipping"),
        }
    }
    items
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
