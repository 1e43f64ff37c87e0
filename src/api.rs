// src/api.rs
//! Read-only display/status surface for an external renderer. The engine
//! computes what to show; this router only hands the values out.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;

use crate::aggregate::DashboardView;
use crate::engine::SyncEngine;
use crate::scheduler::SyncTrigger;
use crate::sources::probe::SourceStatus;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/dashboard", get(dashboard))
        .route("/api/status", get(status))
        .route("/api/sync", post(trigger_sync))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.engine.dashboard_view())
}

#[derive(serde::Serialize)]
struct StatusResp {
    online: bool,
    sources: Vec<SourceStatus>,
    last_sync: BTreeMap<String, DateTime<Utc>>,
}

async fn status(State(state): State<AppState>) -> Json<StatusResp> {
    let engine = &state.engine;
    let last_sync = engine
        .sources()
        .iter()
        .filter_map(|s| {
            let name = s.name().to_string();
            engine.last_sync_for(&name).map(|ts| (name, ts))
        })
        .collect();
    Json(StatusResp {
        online: engine.is_online(),
        sources: engine.source_statuses(),
        last_sync,
    })
}

#[derive(serde::Serialize)]
struct TriggerResp {
    accepted: bool,
    at: DateTime<Utc>,
}

/// Manual refresh: enqueue a trigger and return immediately. The round runs
/// in the background.
async fn trigger_sync(State(state): State<AppState>) -> (StatusCode, Json<TriggerResp>) {
    state.engine.trigger(SyncTrigger::CrossInstance).await;
    (
        StatusCode::ACCEPTED,
        Json(TriggerResp {
            accepted: true,
            at: Utc::now(),
        }),
    )
}
