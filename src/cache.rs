// src/cache.rs
//! Last-known-good snapshot store, keyed per source.
//!
//! Writers are the fetchers (on success only); the aggregator and the API are
//! read-only. An entry changes exclusively through `put` after a successful
//! fetch — a failed fetch leaves it untouched, so a stale entry can persist
//! indefinitely while its source stays unreachable. That is the staleness
//! policy, not a bug.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::snapshot::SourceData;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub value: SourceData,
    pub timestamp: DateTime<Utc>,
}

/// Shared handle to the cache. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means "never synced" — a first-class result, not an error.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner
            .read()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    /// Unconditional overwrite. No merge, no versioning.
    pub fn put(&self, key: &str, value: SourceData, timestamp: DateTime<Utc>) {
        self.inner
            .write()
            .expect("cache lock poisoned")
            .insert(key.to_string(), CacheEntry { value, timestamp });
    }

    /// Point-in-time copy of the contents, for aggregation.
    pub fn entries(&self) -> Vec<(String, CacheEntry)> {
        let guard = self.inner.read().expect("cache lock poisoned");
        let mut out: Vec<_> = guard.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        // Stable order keeps aggregation and logs deterministic.
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
