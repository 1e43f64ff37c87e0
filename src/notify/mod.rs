// src/notify/mod.rs
pub mod webhook;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::notify::webhook::WebhookNotifier;

/// Discrete events the engine emits. Delivery/display is an external
/// collaborator's job; the engine only decides what happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    SyncComplete {
        degraded: bool,
        failed: Vec<String>,
    },
    SyncError {
        message: String,
    },
    NewActivity {
        source: String,
        detail: String,
    },
    DeadlineAlert {
        pending: usize,
    },
}

impl NotificationEvent {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationEvent::SyncComplete { .. } => "sync_complete",
            NotificationEvent::SyncError { .. } => "sync_error",
            NotificationEvent::NewActivity { .. } => "new_activity",
            NotificationEvent::DeadlineAlert { .. } => "deadline_alert",
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, ev: &NotificationEvent) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Fan-out over configured sinks plus an in-process broadcast channel for
/// subscribers (tests, sibling components). Sink errors are logged, never
/// propagated.
pub struct NotifierMux {
    sinks: Vec<Box<dyn Notifier>>,
    tx: broadcast::Sender<NotificationEvent>,
}

impl NotifierMux {
    pub fn new(sinks: Vec<Box<dyn Notifier>>) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { sinks, tx }
    }

    /// Sinks from the environment: a webhook if `SYNC_WEBHOOK_URL` is set,
    /// otherwise broadcast-only.
    pub fn from_env() -> Self {
        let mut sinks: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(hook) = WebhookNotifier::from_env() {
            sinks.push(Box::new(hook));
        }
        Self::new(sinks)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }

    pub async fn notify(&self, ev: &NotificationEvent) {
        tracing::info!(event = ev.label(), "notification");
        // Send errors just mean nobody is subscribed right now.
        let _ = self.tx.send(ev.clone());
        for sink in &self.sinks {
            if let Err(e) = sink.send(ev).await {
                tracing::warn!(sink = sink.name(), error = ?e, "notifier failed");
            }
        }
    }
}

impl Default for NotifierMux {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
