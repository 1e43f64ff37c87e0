// src/coordinator.rs
//! One synchronization round: every source fetched concurrently, all
//! outcomes collected regardless of individual failures, then aggregation
//! and notifications.
//!
//! Individual fetch failures are absorbed (the source keeps its cached
//! snapshot) and only recorded in the round result. A failure of the
//! orchestration itself — a sync task aborting — is fatal to the round and
//! schedules the single delayed retry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use tokio::task::JoinSet;

use crate::aggregate::DashboardMetrics;
use crate::engine::SyncEngine;
use crate::notify::NotificationEvent;
use crate::scheduler::SyncTrigger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Success,
    Failed(String),
}

/// Produced once per round, consumed, then discarded. No round history.
#[derive(Debug, Clone)]
pub struct SyncRoundResult {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub outcomes: Vec<(String, SourceOutcome)>,
}

impl SyncRoundResult {
    pub fn failed_sources(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, SourceOutcome::Failed(_)))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn fully_successful(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, o)| matches!(o, SourceOutcome::Success))
    }

    pub fn outcome_for(&self, source: &str) -> Option<&SourceOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, o)| o)
    }
}

impl SyncEngine {
    /// Run one full round. Waits for every fetch to settle — no fetch
    /// cancels the round, completion order is unspecified — then aggregates
    /// and notifies.
    pub async fn run_full_sync(self: &Arc<Self>) -> Result<SyncRoundResult> {
        let started_at = Utc::now();

        let mut tasks = JoinSet::new();
        for source in self.sources() {
            let source = Arc::clone(source);
            let fetcher = self.fetcher().clone();
            tasks.spawn(async move {
                let name = source.name().to_string();
                let outcome = fetcher.sync_source(source.as_ref()).await;
                (name, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(self.sources().len());
        let mut activities = Vec::new();
        let mut round_error: Option<anyhow::Error> = None;
        while let Some(settled) = tasks.join_next().await {
            match settled {
                Ok((name, fetch)) => match fetch.error {
                    None => {
                        self.record_success(&name, Utc::now());
                        if let Some(detail) = fetch.activity {
                            activities.push((name.clone(), detail));
                        }
                        tracing::info!(source = %name, "sync ok");
                        outcomes.push((name, SourceOutcome::Success));
                    }
                    Some(reason) => {
                        tracing::warn!(source = %name, reason = %reason, "sync failed");
                        outcomes.push((name, SourceOutcome::Failed(reason)));
                    }
                },
                // A task that cannot settle (panic/abort) is an orchestration
                // failure, not a source failure. The round is doomed, but the
                // remaining fetches keep running to completion; only the
                // first such error is surfaced.
                Err(e) => {
                    if round_error.is_none() {
                        round_error = Some(anyhow::Error::new(e).context("sync task aborted"));
                    }
                }
            }
        }
        if let Some(e) = round_error {
            return Err(e);
        }

        // Aggregation runs strictly after all fetches settled.
        let metrics = DashboardMetrics::compute(self.cache());
        publish_dashboard_gauges(&metrics);

        let result = SyncRoundResult {
            started_at,
            completed_at: Utc::now(),
            outcomes,
        };

        for (source, detail) in activities {
            self.notifier()
                .notify(&NotificationEvent::NewActivity { source, detail })
                .await;
        }
        let failed = result.failed_sources();
        self.notifier()
            .notify(&NotificationEvent::SyncComplete {
                degraded: !failed.is_empty(),
                failed,
            })
            .await;
        if metrics.pending_deadlines > 0 {
            self.notifier()
                .notify(&NotificationEvent::DeadlineAlert {
                    pending: metrics.pending_deadlines,
                })
                .await;
        }

        Ok(result)
    }

    /// Round entry point for the dispatch loop: runs the round and, on a
    /// round-level failure, emits `sync_error` and enqueues exactly one
    /// delayed retry. The retry is honored only if the engine still
    /// believes itself online when it fires.
    pub async fn run_round(self: Arc<Self>) {
        crate::metrics::ensure_sync_metrics_described();
        counter!("sync_rounds_total").increment(1);
        let t0 = std::time::Instant::now();

        match self.run_full_sync().await {
            Ok(result) => {
                let ms = t0.elapsed().as_secs_f64() * 1_000.0;
                histogram!("sync_round_ms").record(ms);
                gauge!("sync_last_round_ts").set(Utc::now().timestamp() as f64);
                tracing::info!(
                    sources = result.outcomes.len(),
                    failed = result.failed_sources().len(),
                    degraded = !result.fully_successful(),
                    "sync round complete"
                );
            }
            Err(e) => {
                counter!("sync_round_errors_total").increment(1);
                let message = format!("{e:#}");
                tracing::error!(error = %message, "sync round failed");
                self.notifier()
                    .notify(&NotificationEvent::SyncError { message })
                    .await;

                let delay = Duration::from_secs(self.config().retry_delay_secs);
                let engine = Arc::clone(&self);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    engine.trigger(SyncTrigger::RetryAfterError).await;
                });
            }
        }
    }
}

fn publish_dashboard_gauges(metrics: &DashboardMetrics) {
    gauge!("dashboard_total_cases").set(metrics.total_cases as f64);
    gauge!("dashboard_total_clients").set(metrics.total_clients as f64);
    gauge!("dashboard_portfolio_value").set(metrics.portfolio_value);
    gauge!("dashboard_pending_deadlines").set(metrics.pending_deadlines as f64);
    gauge!("dashboard_training_progress_pct").set(metrics.average_training_pct);
}
