// src/registry.rs
use serde::{Deserialize, Serialize};

/// The four backend systems the dashboard aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Crm,
    Appraisals,
    Clients,
    Training,
}

impl SourceKind {
    /// Relative path of the data resource on the source origin.
    pub fn data_path(&self) -> &'static str {
        match self {
            SourceKind::Crm => "/api/stats",
            SourceKind::Appraisals => "/api/valuations",
            SourceKind::Clients => "/api/clients",
            SourceKind::Training => "/api/progress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub endpoint: String,
    pub kind: SourceKind,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            kind,
        }
    }

    /// Cache Store key for this source's snapshot.
    pub fn cache_key(&self) -> String {
        format!("{}_data", self.name)
    }

    /// Full URL of the data resource.
    pub fn data_url(&self) -> String {
        format!(
            "{}{}",
            self.endpoint.trim_end_matches('/'),
            self.kind.data_path()
        )
    }
}

/// Fixed, ordered set of sources. Built once at startup, no mutation ops.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        Self { sources }
    }

    pub fn list(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
