// src/signal.rs
//! Cross-instance trigger bus.
//!
//! Stand-in for a shared key-value broadcast between sibling instances: any
//! instance publishing the reserved key causes every subscribed engine to
//! run a round. Signals with other keys are ignored.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::engine::SyncEngine;
use crate::scheduler::SyncTrigger;

/// Reserved key that requests a sync round in every instance.
pub const SYNC_TRIGGER_KEY: &str = "portal_sync_trigger";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<Signal>,
}

impl SignalBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn publish(&self, key: &str) {
        let _ = self.tx.send(Signal {
            key: key.to_string(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.tx.subscribe()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards reserved-key signals into the engine's trigger queue.
pub fn spawn_signal_listener(engine: Arc<SyncEngine>, bus: &SignalBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(signal) if signal.key == SYNC_TRIGGER_KEY => {
                    engine.trigger(SyncTrigger::CrossInstance).await;
                }
                Ok(signal) => {
                    tracing::trace!(key = %signal.key, "ignoring unrelated signal");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "signal listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
