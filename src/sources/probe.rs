// src/sources/probe.rs
//! Connectivity probes: lightweight HEAD existence checks per source.
//!
//! Probe results live in `SourceStatus`, overwritten on every cycle — no
//! history. This routine is the sole writer of that map.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::registry::SourceDescriptor;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub online: bool,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// HEAD each source origin with the given timeout. Failures are recorded,
/// logged and re-probed next cycle; nothing here is fatal.
pub async fn probe_all(
    client: &reqwest::Client,
    sources: &[SourceDescriptor],
    timeout: Duration,
) -> HashMap<String, SourceStatus> {
    let mut out = HashMap::with_capacity(sources.len());
    for descriptor in sources {
        let status = probe_one(client, descriptor, timeout).await;
        if status.online {
            tracing::info!(source = %descriptor.name, "source online");
        } else {
            tracing::warn!(
                source = %descriptor.name,
                error = status.error.as_deref().unwrap_or("unknown"),
                "source offline"
            );
            counter!("sync_probe_failures_total").increment(1);
        }
        out.insert(descriptor.name.clone(), status);
    }
    out
}

async fn probe_one(
    client: &reqwest::Client,
    descriptor: &SourceDescriptor,
    timeout: Duration,
) -> SourceStatus {
    let result = client
        .head(&descriptor.endpoint)
        .timeout(timeout)
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() || resp.status().is_redirection() => SourceStatus {
            name: descriptor.name.clone(),
            online: true,
            last_check: Utc::now(),
            error: None,
        },
        Ok(resp) => SourceStatus {
            name: descriptor.name.clone(),
            online: false,
            last_check: Utc::now(),
            error: Some(format!("status {}", resp.status())),
        },
        Err(e) => SourceStatus {
            name: descriptor.name.clone(),
            online: false,
            last_check: Utc::now(),
            error: Some(format!("{e:#}")),
        },
    }
}
