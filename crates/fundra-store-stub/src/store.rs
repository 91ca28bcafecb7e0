// SPDX-License-Identifier: BUSL-1.1
//! In-memory storage backend using DashMap.
//!
//! Each platform collection gets its own `DashMap<String, serde_json::Value>`
//! keyed by record id. Records are stored as raw JSON so the stub passes
//! camelCase payloads through unmodified.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

/// Collections the platform record store serves.
pub const COLLECTIONS: &[&str] = &[
    "projects",
    "milestones",
    "investments",
    "verifications",
    "users",
    "notifications",
    "transactions",
    "rules",
    "evaluations",
];

struct Inner {
    collections: DashMap<&'static str, DashMap<String, Value>>,
}

/// Shared application state holding all in-memory collections.
///
/// Cheaply cloneable via `Arc` — all clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new() -> Self {
        let collections = DashMap::new();
        for name in COLLECTIONS {
            collections.insert(*name, DashMap::new());
        }
        Self {
            inner: Arc::new(Inner { collections }),
        }
    }

    /// Look up a collection by name; `None` for anything outside the
    /// platform's entity set.
    pub fn collection(
        &self,
        name: &str,
    ) -> Option<dashmap::mapref::one::Ref<'_, &'static str, DashMap<String, Value>>> {
        self.inner.collections.get(name)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
