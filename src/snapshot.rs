// src/snapshot.rs
//! Per-source derived snapshots — the value shape stored in the cache.
//! The store itself treats these as opaque; only the aggregator looks inside.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::SourceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    pub case_id: String,
    pub label: String,
    pub due: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub id: u64,
    /// Appraised value in euros.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: u64,
    pub name: String,
}

/// CRM: active trademark cases per principal, upcoming deadlines, last activity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrmSnapshot {
    #[serde(default)]
    pub active_cases_by_user: BTreeMap<String, u64>,
    #[serde(default)]
    pub pending_deadlines: Vec<Deadline>,
    #[serde(default)]
    pub last_activity: Option<String>,
}

/// Appraisal service: open appraisals and the valuation list behind the
/// portfolio total.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppraisalSnapshot {
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub valuations: Vec<Valuation>,
}

/// Client registry: the unified client list (ids may repeat across systems).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientSnapshot {
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
    #[serde(default)]
    pub new_this_month: u64,
}

/// Training portal: progress figures per principal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingSnapshot {
    #[serde(default)]
    pub average_progress_pct: f64,
    #[serde(default)]
    pub modules_completed: u64,
    #[serde(default)]
    pub progress_by_user: BTreeMap<String, f64>,
}

/// One source's cached snapshot, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceData {
    Crm(CrmSnapshot),
    Appraisals(AppraisalSnapshot),
    Clients(ClientSnapshot),
    Training(TrainingSnapshot),
}

impl SourceData {
    /// The empty/default structure served when a source has never synced.
    pub fn empty(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Crm => SourceData::Crm(CrmSnapshot::default()),
            SourceKind::Appraisals => SourceData::Appraisals(AppraisalSnapshot::default()),
            SourceKind::Clients => SourceData::Clients(ClientSnapshot::default()),
            SourceKind::Training => SourceData::Training(TrainingSnapshot::default()),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceData::Crm(_) => SourceKind::Crm,
            SourceData::Appraisals(_) => SourceKind::Appraisals,
            SourceData::Clients(_) => SourceKind::Clients,
            SourceData::Training(_) => SourceKind::Training,
        }
    }

    /// CRM activity marker, if this is a CRM snapshot. Used for
    /// `new_activity` change detection.
    pub fn activity_marker(&self) -> Option<&str> {
        match self {
            SourceData::Crm(s) => s.last_activity.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_kind() {
        for kind in [
            SourceKind::Crm,
            SourceKind::Appraisals,
            SourceKind::Clients,
            SourceKind::Training,
        ] {
            assert_eq!(SourceData::empty(kind).kind(), kind);
        }
    }

    #[test]
    fn snapshot_json_round_trips_with_kind_tag() {
        let data = SourceData::Appraisals(AppraisalSnapshot {
            active: 2,
            valuations: vec![Valuation { id: 7, value: 120_000.0 }],
        });
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"kind\":\"appraisals\""));
        let back: SourceData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let s: CrmSnapshot = serde_json::from_str("{}").unwrap();
        assert!(s.active_cases_by_user.is_empty());
        assert!(s.pending_deadlines.is_empty());
        assert_eq!(s.last_activity, None);
    }
}
