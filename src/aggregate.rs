// src/aggregate.rs
//! Cross-source aggregate metrics.
//!
//! Pure functions over current cache contents — no I/O, no history. Every
//! aggregate is recomputable at any time from the cache alone, so a degraded
//! round (stale entries mixed with fresh ones) aggregates exactly like any
//! other cache state.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheEntry, CacheStore};
use crate::snapshot::{ClientSnapshot, CrmSnapshot, SourceData};

/// The fixed set of principals whose per-user figures roll up into totals.
pub const PRINCIPALS: [&str; 5] = ["giorgio", "sandro", "amedeo", "nico", "gabriel"];

/// Sum of active cases over the known principals; a missing per-user value
/// counts as zero, never as an error.
pub fn total_active_cases(crm: &CrmSnapshot) -> u64 {
    PRINCIPALS
        .iter()
        .map(|user| crm.active_cases_by_user.get(*user).copied().unwrap_or(0))
        .sum()
}

pub fn pending_deadline_count(crm: &CrmSnapshot) -> usize {
    crm.pending_deadlines.len()
}

/// Set-cardinality over client ids; duplicates across the list count once.
pub fn distinct_client_ids(clients: &ClientSnapshot) -> HashSet<u64> {
    clients.clients.iter().map(|c| c.id).collect()
}

/// Aggregate view over all cache entries. Entries are folded by snapshot
/// variant, so sums and dedup run across every source of a given kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DashboardMetrics {
    pub total_cases: u64,
    pub total_clients: usize,
    pub portfolio_value: f64,
    pub active_appraisals: u64,
    pub pending_deadlines: usize,
    pub average_training_pct: f64,
}

impl DashboardMetrics {
    pub fn compute(cache: &CacheStore) -> Self {
        Self::from_entries(&cache.entries())
    }

    pub fn from_entries(entries: &[(String, CacheEntry)]) -> Self {
        let mut metrics = DashboardMetrics::default();
        let mut client_ids: HashSet<u64> = HashSet::new();
        let mut training_sum = 0.0;
        let mut training_sources = 0usize;

        for (_, entry) in entries {
            match &entry.value {
                SourceData::Crm(s) => {
                    metrics.total_cases += total_active_cases(s);
                    metrics.pending_deadlines += pending_deadline_count(s);
                }
                SourceData::Appraisals(s) => {
                    metrics.active_appraisals += s.active;
                    // Missing values cannot occur per type; an empty list sums to 0.
                    metrics.portfolio_value += s.valuations.iter().map(|v| v.value).sum::<f64>();
                }
                SourceData::Clients(s) => {
                    client_ids.extend(distinct_client_ids(s));
                }
                SourceData::Training(s) => {
                    training_sum += s.average_progress_pct;
                    training_sources += 1;
                }
            }
        }

        metrics.total_clients = client_ids.len();
        metrics.average_training_pct = if training_sources > 0 {
            training_sum / training_sources as f64
        } else {
            0.0
        };
        metrics
    }
}

/// Named display values for an external renderer. The engine computes what
/// to show; painting it is someone else's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub total_cases: u64,
    pub total_clients: usize,
    pub total_value: String,
    pub pending_deadlines: usize,
    pub average_training_pct: f64,
    pub last_sync_time: Option<String>,
}

impl DashboardView {
    pub fn new(metrics: &DashboardMetrics, last_sync: Option<DateTime<Utc>>) -> Self {
        Self {
            total_cases: metrics.total_cases,
            total_clients: metrics.total_clients,
            total_value: format_eur(metrics.portfolio_value),
            pending_deadlines: metrics.pending_deadlines,
            average_training_pct: metrics.average_training_pct,
            last_sync_time: last_sync.map(|t| t.format("%H:%M:%S").to_string()),
        }
    }
}

/// Euro amount with dot thousands grouping and no decimals, e.g.
/// `7.800.000 €`.
pub fn format_eur(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let negative = rounded < 0;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped} €")
    } else {
        format!("{grouped} €")
    }
}
