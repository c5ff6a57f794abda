// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content items: the unit of promote work.

use serde::{Deserialize, Serialize};

/// One document to promote, identified by its path relative to the tree root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Path relative to the tree root, always starting with `/`
    pub path: String,
    /// Where the backend fetches the staged content from
    pub source: String,
}

impl Item {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self { path: path.into(), source: source.into() }
    }

    /// Parent folder of the item (`/` for top-level items).
    pub fn folder(&self) -> &str {
        match self.path.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.path[..idx],
        }
    }

    /// Path under which the distribution network serves this document.
    ///
    /// Spreadsheets are served as `.json`; every other document drops its
    /// extension.
    pub fn public_path(&self) -> String {
        public_path(&self.path)
    }
}

/// Map a document path to the path the distribution network serves it at.
pub fn public_path(path: &str) -> String {
    if let Some(stem) = path.strip_suffix(".xlsx") {
        return format!("{stem}.json");
    }
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(dot) => path[..name_start + dot].to_string(),
        None => path.to_string(),
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
