// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_sync_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sync_rounds_total", "Synchronization rounds started.");
        describe_counter!(
            "sync_round_errors_total",
            "Rounds that failed at the orchestration level."
        );
        describe_counter!("sync_source_success_total", "Per-source successful fetches.");
        describe_counter!(
            "sync_source_failures_total",
            "Per-source fetch failures (served stale)."
        );
        describe_counter!("sync_probe_failures_total", "Failed connectivity probes.");
        describe_histogram!("sync_round_ms", "Full round duration in milliseconds.");
        describe_gauge!("sync_last_round_ts", "Unix ts of the last completed round.");
        describe_gauge!("dashboard_total_cases", "Aggregated active case count.");
        describe_gauge!("dashboard_total_clients", "Deduplicated client count.");
        describe_gauge!("dashboard_portfolio_value", "Portfolio valuation sum (EUR).");
        describe_gauge!("dashboard_pending_deadlines", "Pending deadline count.");
        describe_gauge!(
            "dashboard_training_progress_pct",
            "Average training progress percentage."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Call once from the entrypoint.
    pub fn init() -> Self {
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");
        ensure_sync_metrics_described();
        Self { handle }
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
