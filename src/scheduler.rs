// src/scheduler.rs
//! Trigger policy: every external signal becomes a typed message on one
//! queue, and a single dispatch loop decides whether a round runs.
//!
//! Two states, Online and Offline. Ticks while Offline are dropped outright
//! (not queued for later); the transition back to Online runs one round
//! immediately. Triggers are never coalesced: two triggers in close
//! succession start two independent rounds.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::SyncEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Periodic timer tick.
    Tick,
    /// External connectivity signal.
    ConnectivityChanged { online: bool },
    /// The app instance returned to the foreground.
    VisibilityRegained,
    /// A sibling instance asked everyone to refresh.
    CrossInstance,
    /// The delayed retry after a round-level failure.
    RetryAfterError,
}

impl SyncTrigger {
    pub fn label(&self) -> &'static str {
        match self {
            SyncTrigger::Tick => "tick",
            SyncTrigger::ConnectivityChanged { .. } => "connectivity",
            SyncTrigger::VisibilityRegained => "visibility",
            SyncTrigger::CrossInstance => "cross_instance",
            SyncTrigger::RetryAfterError => "retry",
        }
    }
}

/// Whether a trigger starts a round, given the state *after* any
/// connectivity transition it carries has been applied.
pub(crate) fn starts_round(trigger: &SyncTrigger, online: bool) -> bool {
    match trigger {
        SyncTrigger::Tick => online,
        SyncTrigger::ConnectivityChanged { online: now_online } => *now_online,
        SyncTrigger::VisibilityRegained => online,
        // Cross-instance signals fire regardless of which instance produced
        // them and regardless of local connectivity belief.
        SyncTrigger::CrossInstance => true,
        SyncTrigger::RetryAfterError => online,
    }
}

/// Pushes `Tick` every `interval_secs`. The Online gate lives in the
/// dispatch loop, not here.
pub fn spawn_ticker(engine: Arc<SyncEngine>) -> JoinHandle<()> {
    let interval_secs = engine.config().interval_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        // The first tick completes immediately; the startup round is
        // triggered explicitly by main, so skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            engine.trigger(SyncTrigger::Tick).await;
        }
    })
}

/// Re-probes source connectivity every `interval_secs`, overwriting the
/// per-source status map each cycle. Probe failures are recorded there and
/// simply probed again next cycle. The startup probe is the entrypoint's
/// job; the immediate first tick is skipped here too.
pub fn spawn_prober(engine: Arc<SyncEngine>) -> JoinHandle<()> {
    let interval_secs = engine.config().interval_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            engine.refresh_status().await;
        }
    })
}

/// Consumes the trigger queue until all senders are gone. Each qualifying
/// trigger spawns an independent round task.
pub async fn run_dispatch_loop(engine: Arc<SyncEngine>, mut rx: mpsc::Receiver<SyncTrigger>) {
    while let Some(trigger) = rx.recv().await {
        if let SyncTrigger::ConnectivityChanged { online } = &trigger {
            engine.set_online(*online);
            if *online {
                tracing::info!("connectivity restored");
            } else {
                tracing::info!("offline mode, scheduled syncs suspended");
            }
        }

        if starts_round(&trigger, engine.is_online()) {
            tracing::debug!(trigger = trigger.label(), "starting sync round");
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.run_round().await });
        } else {
            tracing::debug!(trigger = trigger.label(), "trigger dropped while offline");
        }
    }
}
