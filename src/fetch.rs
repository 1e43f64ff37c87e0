// src/fetch.rs
//! Fetch-with-fallback: the resilience core.
//!
//! A successful fetch overwrites the source's cache entry. Any failure leaves
//! the entry untouched and serves the prior cached value (or the empty
//! default if the source never synced), so one unreachable source degrades
//! to stale data instead of failing the whole dashboard. The returned value
//! alone cannot distinguish fresh from stale; the error travels alongside it
//! for status tracking.

use chrono::Utc;
use metrics::counter;

use crate::cache::CacheStore;
use crate::snapshot::SourceData;
use crate::sources::DataSource;

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub data: SourceData,
    /// True when `data` came from the source this round, false when it is
    /// the cached (or empty) fallback.
    pub fresh: bool,
    pub error: Option<String>,
    /// Set when the CRM activity marker changed relative to the prior cache.
    pub activity: Option<String>,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    cache: CacheStore,
}

impl Fetcher {
    pub fn new(cache: CacheStore) -> Self {
        Self { cache }
    }

    pub async fn sync_source(&self, source: &dyn DataSource) -> FetchOutcome {
        let descriptor = source.descriptor();
        let key = descriptor.cache_key();
        let prior = self.cache.get(&key);

        match source.fetch().await {
            Ok(data) => {
                let activity = changed_activity(prior.as_ref().map(|e| &e.value), &data);
                self.cache.put(&key, data.clone(), Utc::now());
                counter!("sync_source_success_total").increment(1);
                FetchOutcome {
                    data,
                    fresh: true,
                    error: None,
                    activity,
                }
            }
            Err(e) => {
                // Cache untouched: last-known-good survives repeated failures.
                tracing::warn!(source = %descriptor.name, error = ?e, "fetch failed, serving cached snapshot");
                counter!("sync_source_failures_total").increment(1);
                let data = prior
                    .map(|entry| entry.value)
                    .unwrap_or_else(|| SourceData::empty(descriptor.kind));
                FetchOutcome {
                    data,
                    fresh: false,
                    error: Some(format!("{e:#}")),
                    activity: None,
                }
            }
        }
    }
}

fn changed_activity(prior: Option<&SourceData>, fresh: &SourceData) -> Option<String> {
    let new_marker = fresh.activity_marker()?;
    let old_marker = prior.and_then(|p| p.activity_marker());
    if old_marker != Some(new_marker) {
        Some(new_marker.to_string())
    } else {
        None
    }
}
