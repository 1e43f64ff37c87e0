// tests/sync_round.rs
//
// Round-level behavior with fixture sources:
// - partial failure: failed sources keep their pre-round cache, the rest
//   update, and the aggregate reflects the mix
// - no regression: a failed fetch leaves the cache entry untouched
// - degraded rounds are reported as such

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use portal_sync::aggregate::DashboardMetrics;
use portal_sync::config::SyncConfig;
use portal_sync::coordinator::SourceOutcome;
use portal_sync::engine::SyncEngine;
use portal_sync::notify::{NotificationEvent, NotifierMux};
use portal_sync::registry::{SourceDescriptor, SourceKind};
use portal_sync::snapshot::{AppraisalSnapshot, SourceData, Valuation};
use portal_sync::sources::fixture::{FailingSource, FixtureSource};
use portal_sync::sources::DataSource;

fn test_config() -> SyncConfig {
    SyncConfig {
        interval_secs: 3600,
        retry_delay_secs: 1,
        probe_timeout_secs: 1,
        bind_addr: "127.0.0.1:0".into(),
        sources: vec![],
    }
}

fn appraisal_source(name: &str, value: f64, id: u64) -> Arc<dyn DataSource> {
    let descriptor = SourceDescriptor::new(
        name,
        format!("https://{name}.example.org"),
        SourceKind::Appraisals,
    );
    Arc::new(FixtureSource::new(
        descriptor,
        SourceData::Appraisals(AppraisalSnapshot {
            active: 1,
            valuations: vec![Valuation { id, value }],
        }),
    ))
}

fn failing_source(name: &str) -> Arc<dyn DataSource> {
    let descriptor = SourceDescriptor::new(
        name,
        format!("https://{name}.example.org"),
        SourceKind::Appraisals,
    );
    Arc::new(FailingSource::new(descriptor, "connection refused"))
}

fn cached_appraisal(value: f64, id: u64) -> SourceData {
    SourceData::Appraisals(AppraisalSnapshot {
        active: 1,
        valuations: vec![Valuation { id, value }],
    })
}

#[tokio::test]
async fn partial_failure_mixes_fresh_and_stale() {
    // A succeeds with 100, B fails (prior cache 20), C succeeds with 50.
    let sources = vec![
        appraisal_source("a", 100.0, 1),
        failing_source("b"),
        appraisal_source("c", 50.0, 3),
    ];
    let (engine, _rx) = SyncEngine::new(test_config(), sources, NotifierMux::default());
    engine.cache().put("b_data", cached_appraisal(20.0, 2), Utc::now());

    let result = engine.run_full_sync().await.expect("round should settle");

    assert_eq!(result.outcome_for("a"), Some(&SourceOutcome::Success));
    assert!(matches!(
        result.outcome_for("b"),
        Some(SourceOutcome::Failed(_))
    ));
    assert_eq!(result.outcome_for("c"), Some(&SourceOutcome::Success));
    assert!(!result.fully_successful());

    let metrics = DashboardMetrics::compute(engine.cache());
    assert_eq!(metrics.portfolio_value, 170.0);
}

#[tokio::test]
async fn failed_fetch_leaves_entry_byte_equal() {
    let (engine, _rx) = SyncEngine::new(
        test_config(),
        vec![failing_source("b")],
        NotifierMux::default(),
    );
    engine.cache().put("b_data", cached_appraisal(20.0, 2), Utc::now());
    let before = engine.cache().get("b_data").expect("seeded entry");

    let result = engine.run_full_sync().await.expect("round should settle");
    assert!(matches!(
        result.outcome_for("b"),
        Some(SourceOutcome::Failed(_))
    ));
    assert_eq!(engine.cache().get("b_data").expect("entry survives"), before);

    // Last-success stamp also untouched by a failure.
    assert_eq!(engine.last_sync_for("b"), None);
}

#[tokio::test]
async fn all_failed_sources_aggregate_from_prior_cache() {
    let sources = vec![failing_source("a"), failing_source("b")];
    let (engine, _rx) = SyncEngine::new(test_config(), sources, NotifierMux::default());
    engine.cache().put("a_data", cached_appraisal(30.0, 1), Utc::now());
    // b never synced: absent entry contributes nothing.

    let result = engine.run_full_sync().await.expect("round should settle");
    assert_eq!(result.failed_sources().len(), 2);

    let metrics = DashboardMetrics::compute(engine.cache());
    assert_eq!(metrics.portfolio_value, 30.0);
    assert!(engine.cache().get("b_data").is_none());
}

#[tokio::test]
async fn degraded_round_notifies_with_failed_names() {
    let sources = vec![appraisal_source("a", 100.0, 1), failing_source("b")];
    let (engine, _rx) = SyncEngine::new(test_config(), sources, NotifierMux::default());
    let mut events = engine.notifier().subscribe();

    engine.run_full_sync().await.expect("round should settle");

    let ev = events.recv().await.expect("sync_complete event");
    assert_eq!(
        ev,
        NotificationEvent::SyncComplete {
            degraded: true,
            failed: vec!["b".to_string()],
        }
    );
}

#[tokio::test]
async fn clean_round_notifies_not_degraded_and_stamps_sources() {
    let sources = vec![appraisal_source("a", 10.0, 1)];
    let (engine, _rx) = SyncEngine::new(test_config(), sources, NotifierMux::default());
    let mut events = engine.notifier().subscribe();

    let result = engine.run_full_sync().await.expect("round should settle");
    assert!(result.fully_successful());
    assert!(engine.last_sync_for("a").is_some());

    let ev = events.recv().await.expect("sync_complete event");
    assert_eq!(
        ev,
        NotificationEvent::SyncComplete {
            degraded: false,
            failed: vec![],
        }
    );
}

/// Panics on fetch; a task that cannot settle fails the round itself.
struct AbortingSource {
    descriptor: SourceDescriptor,
}

#[async_trait::async_trait]
impl DataSource for AbortingSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self) -> anyhow::Result<SourceData> {
        panic!("sync task lost");
    }
}

/// Succeeds after a delay, counting completions.
struct SlowSource {
    descriptor: SourceDescriptor,
    delay: Duration,
    completed: AtomicUsize,
}

#[async_trait::async_trait]
impl DataSource for SlowSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self) -> anyhow::Result<SourceData> {
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(cached_appraisal(40.0, 9))
    }
}

#[tokio::test]
async fn aborted_task_fails_round_but_inflight_fetches_settle() {
    // One task dies immediately, the other is mid-fetch. The round must
    // still wait for the slow fetch before surfacing the failure.
    let slow = Arc::new(SlowSource {
        descriptor: SourceDescriptor::new(
            "slow",
            "https://slow.example.org",
            SourceKind::Appraisals,
        ),
        delay: Duration::from_millis(300),
        completed: AtomicUsize::new(0),
    });
    let aborting = Arc::new(AbortingSource {
        descriptor: SourceDescriptor::new(
            "boom",
            "https://boom.example.org",
            SourceKind::Appraisals,
        ),
    });
    let sources: Vec<Arc<dyn DataSource>> = vec![
        aborting as Arc<dyn DataSource>,
        slow.clone() as Arc<dyn DataSource>,
    ];
    let (engine, _rx) = SyncEngine::new(test_config(), sources, NotifierMux::default());

    let err = engine
        .run_full_sync()
        .await
        .expect_err("aborted task fails the round");
    assert!(format!("{err:#}").contains("sync task aborted"));

    // The in-flight fetch was not cancelled: it completed and its snapshot
    // landed in the cache before the error surfaced.
    assert_eq!(slow.completed.load(Ordering::SeqCst), 1);
    assert_eq!(
        engine.cache().get("slow_data").expect("slow entry written").value,
        cached_appraisal(40.0, 9)
    );
}

#[tokio::test]
async fn repeated_rounds_converge_on_same_aggregate() {
    // Aggregation purity at round level: two rounds over fixed sources
    // produce identical metrics.
    let sources = vec![appraisal_source("a", 10.0, 1), appraisal_source("c", 5.0, 2)];
    let (engine, _rx) = SyncEngine::new(test_config(), sources, NotifierMux::default());

    engine.run_full_sync().await.expect("first round");
    let first = DashboardMetrics::compute(engine.cache());
    engine.run_full_sync().await.expect("second round");
    let second = DashboardMetrics::compute(engine.cache());
    assert_eq!(first, second);
}
