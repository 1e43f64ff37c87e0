//! Dashboard Sync Engine — Binary Entrypoint
//! Boots the engine context, trigger loop and the read-only display API.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use portal_sync::api::{self, AppState};
use portal_sync::config::SyncConfig;
use portal_sync::engine::SyncEngine;
use portal_sync::metrics::Metrics;
use portal_sync::notify::NotifierMux;
use portal_sync::scheduler::{self, SyncTrigger};
use portal_sync::signal::{spawn_signal_listener, SignalBus};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("portal_sync=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = Metrics::init();
    let config = SyncConfig::load_default().context("loading sync config")?;
    tracing::info!(
        sources = config.sources.len(),
        interval_secs = config.interval_secs,
        "starting sync engine"
    );

    // One explicit context for the whole process; everything downstream
    // holds a handle to it.
    let (engine, trigger_rx) = SyncEngine::with_http_sources(config, NotifierMux::from_env());

    let bus = SignalBus::new();
    spawn_signal_listener(engine.clone(), &bus);
    tokio::spawn(scheduler::run_dispatch_loop(engine.clone(), trigger_rx));
    scheduler::spawn_ticker(engine.clone());
    scheduler::spawn_prober(engine.clone());

    // Startup: probe connectivity, then kick the first round through the
    // queue like any other trigger. The prober re-probes every interval.
    engine.refresh_status().await;
    engine.trigger(SyncTrigger::ConnectivityChanged { online: true }).await;

    let router = api::create_router(AppState {
        engine: engine.clone(),
    })
    .merge(metrics.router());

    let addr = engine.config().bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "display API listening");
    axum::serve(listener, router).await.context("serving API")?;

    Ok(())
}
