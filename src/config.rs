// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::registry::{SourceDescriptor, SourceKind, SourceRegistry};

const ENV_PATH: &str = "SYNC_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/sync.toml";

fn default_interval_secs() -> u64 {
    30
}
fn default_retry_delay_secs() -> u64 {
    60
}
fn default_probe_timeout_secs() -> u64 {
    5
}
fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Periodic sync interval while online.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Delay before the single retry after a round-level failure.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Timeout for connectivity probes and data fetches.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            bind_addr: default_bind_addr(),
            sources: default_sources(),
        }
    }
}

/// The standard four-system registry, used when no config file names any.
fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new("crm", "https://crm.example.org", SourceKind::Crm),
        SourceDescriptor::new(
            "appraisals",
            "https://appraisals.example.org",
            SourceKind::Appraisals,
        ),
        SourceDescriptor::new("clients", "https://clients.example.org", SourceKind::Clients),
        SourceDescriptor::new(
            "training",
            "https://training.example.org",
            SourceKind::Training,
        ),
    ]
}

impl SyncConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sync config from {}", path.display()))?;
        let mut cfg: SyncConfig = toml::from_str(&content)
            .with_context(|| format!("parsing sync config at {}", path.display()))?;
        if cfg.sources.is_empty() {
            cfg.sources = default_sources();
        }
        Ok(cfg)
    }

    /// Resolution order: $SYNC_CONFIG_PATH, then config/sync.toml, then
    /// built-in defaults. A missing file is fine; unparsable content is not.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            return Self::from_path(&pb)
                .with_context(|| format!("{ENV_PATH} points to an unusable config"));
        }
        let default = PathBuf::from(DEFAULT_PATH);
        if default.exists() {
            return Self::from_path(&default);
        }
        Ok(Self::default())
    }

    pub fn registry(&self) -> SourceRegistry {
        SourceRegistry::new(self.sources.clone())
    }
}
