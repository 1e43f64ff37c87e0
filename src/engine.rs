// src/engine.rs
//! The engine context: one explicit object built at startup and passed by
//! handle, instead of ambient global state. Lives for the whole process,
//! no teardown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::aggregate::{DashboardMetrics, DashboardView};
use crate::cache::CacheStore;
use crate::config::SyncConfig;
use crate::fetch::Fetcher;
use crate::notify::NotifierMux;
use crate::scheduler::SyncTrigger;
use crate::sources::http::HttpSource;
use crate::sources::probe::{probe_all, SourceStatus};
use crate::sources::DataSource;

pub struct SyncEngine {
    config: SyncConfig,
    sources: Vec<Arc<dyn DataSource>>,
    cache: CacheStore,
    fetcher: Fetcher,
    http: reqwest::Client,
    notifier: NotifierMux,
    triggers: mpsc::Sender<SyncTrigger>,
    /// Connectivity belief driving the trigger policy. Starts online.
    online: AtomicBool,
    /// Per-source status from the last connectivity probe.
    status: RwLock<HashMap<String, SourceStatus>>,
    /// Per-source "last successful sync" stamps; untouched on failure.
    last_sync: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SyncEngine {
    /// Build an engine over explicit sources. Returns the trigger-queue
    /// receiver for `scheduler::run_dispatch_loop`.
    pub fn new(
        config: SyncConfig,
        sources: Vec<Arc<dyn DataSource>>,
        notifier: NotifierMux,
    ) -> (Arc<Self>, mpsc::Receiver<SyncTrigger>) {
        let (tx, rx) = mpsc::channel(64);
        let cache = CacheStore::new();
        let engine = Arc::new(Self {
            fetcher: Fetcher::new(cache.clone()),
            cache,
            sources,
            http: reqwest::Client::new(),
            notifier,
            triggers: tx,
            online: AtomicBool::new(true),
            status: RwLock::new(HashMap::new()),
            last_sync: RwLock::new(HashMap::new()),
            config,
        });
        (engine, rx)
    }

    /// Production wiring: one `HttpSource` per registry entry.
    pub fn with_http_sources(
        config: SyncConfig,
        notifier: NotifierMux,
    ) -> (Arc<Self>, mpsc::Receiver<SyncTrigger>) {
        let client = reqwest::Client::new();
        let timeout = Duration::from_secs(config.probe_timeout_secs);
        let sources: Vec<Arc<dyn DataSource>> = config
            .registry()
            .list()
            .iter()
            .map(|descriptor| {
                Arc::new(HttpSource::new(descriptor.clone(), client.clone(), timeout))
                    as Arc<dyn DataSource>
            })
            .collect();
        Self::new(config, sources, notifier)
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn sources(&self) -> &[Arc<dyn DataSource>] {
        &self.sources
    }

    pub fn notifier(&self) -> &NotifierMux {
        &self.notifier
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Push a trigger onto the queue. Dropped (with a log line) if the
    /// dispatch loop is gone.
    pub async fn trigger(&self, trigger: SyncTrigger) {
        if self.triggers.send(trigger).await.is_err() {
            tracing::warn!("trigger queue closed, dropping trigger");
        }
    }

    pub(crate) fn record_success(&self, source: &str, at: DateTime<Utc>) {
        self.last_sync
            .write()
            .expect("last_sync lock poisoned")
            .insert(source.to_string(), at);
    }

    pub fn last_sync_for(&self, source: &str) -> Option<DateTime<Utc>> {
        self.last_sync
            .read()
            .expect("last_sync lock poisoned")
            .get(source)
            .copied()
    }

    /// Most recent successful sync across all sources.
    pub fn latest_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
            .read()
            .expect("last_sync lock poisoned")
            .values()
            .max()
            .copied()
    }

    pub fn source_statuses(&self) -> Vec<SourceStatus> {
        let guard = self.status.read().expect("status lock poisoned");
        let mut out: Vec<_> = guard.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Probe every source origin and overwrite the status map.
    pub async fn refresh_status(&self) {
        let descriptors: Vec<_> = self
            .sources
            .iter()
            .map(|s| s.descriptor().clone())
            .collect();
        let statuses = probe_all(
            &self.http,
            &descriptors,
            Duration::from_secs(self.config.probe_timeout_secs),
        )
        .await;
        *self.status.write().expect("status lock poisoned") = statuses;
    }

    /// Current display values, recomputed from the cache on demand.
    pub fn dashboard_view(&self) -> DashboardView {
        let metrics = DashboardMetrics::compute(&self.cache);
        DashboardView::new(&metrics, self.latest_sync())
    }
}
