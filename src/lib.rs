// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod fetch;
pub mod metrics;
pub mod notify;
pub mod registry;
pub mod scheduler;
pub mod signal;
pub mod snapshot;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::cache::{CacheEntry, CacheStore};
pub use crate::config::SyncConfig;
pub use crate::coordinator::{SourceOutcome, SyncRoundResult};
pub use crate::engine::SyncEngine;
pub use crate::notify::{NotificationEvent, Notifier, NotifierMux};
pub use crate::registry::{SourceDescriptor, SourceKind, SourceRegistry};
pub use crate::scheduler::SyncTrigger;
pub use crate::snapshot::SourceData;
pub use crate::sources::DataSource;
