// tests/cross_instance.rs
//
// Cross-instance trigger bus: a signal with the reserved key runs a round in
// every subscribed engine instance, regardless of which instance published
// it; signals with other keys are ignored.

use std::sync::Arc;
use std::time::Duration;

use portal_sync::config::SyncConfig;
use portal_sync::engine::SyncEngine;
use portal_sync::notify::{NotificationEvent, NotifierMux};
use portal_sync::registry::{SourceDescriptor, SourceKind};
use portal_sync::scheduler::run_dispatch_loop;
use portal_sync::signal::{spawn_signal_listener, SignalBus, SYNC_TRIGGER_KEY};
use portal_sync::snapshot::{ClientSnapshot, SourceData};
use portal_sync::sources::fixture::FixtureSource;
use portal_sync::sources::DataSource;
use tokio::time::timeout;

fn test_config() -> SyncConfig {
    SyncConfig {
        interval_secs: 3600,
        retry_delay_secs: 60,
        probe_timeout_secs: 1,
        bind_addr: "127.0.0.1:0".into(),
        sources: vec![],
    }
}

fn instance(name: &str, bus: &SignalBus) -> (Arc<SyncEngine>, Arc<FixtureSource>) {
    let descriptor = SourceDescriptor::new(
        name,
        format!("https://{name}.example.org"),
        SourceKind::Clients,
    );
    let source = Arc::new(FixtureSource::new(
        descriptor,
        SourceData::Clients(ClientSnapshot::default()),
    ));
    let (engine, rx) = SyncEngine::new(
        test_config(),
        vec![source.clone() as Arc<dyn DataSource>],
        NotifierMux::default(),
    );
    tokio::spawn(run_dispatch_loop(engine.clone(), rx));
    spawn_signal_listener(engine.clone(), bus);
    (engine, source)
}

async fn await_sync_complete(events: &mut tokio::sync::broadcast::Receiver<NotificationEvent>) {
    loop {
        let ev = timeout(Duration::from_secs(3), events.recv())
            .await
            .expect("timed out waiting for sync_complete")
            .expect("event channel closed");
        if matches!(ev, NotificationEvent::SyncComplete { .. }) {
            return;
        }
    }
}

#[tokio::test]
async fn reserved_key_triggers_all_instances() {
    let bus = SignalBus::new();
    let (engine_a, source_a) = instance("alpha", &bus);
    let (engine_b, source_b) = instance("beta", &bus);
    // Subscribe before publishing so no completion is missed.
    let mut events_a = engine_a.notifier().subscribe();
    let mut events_b = engine_b.notifier().subscribe();
    // Give both listeners a chance to subscribe-spawn before publishing.
    tokio::time::sleep(Duration::from_millis(50)).await;

    bus.publish(SYNC_TRIGGER_KEY);

    await_sync_complete(&mut events_a).await;
    await_sync_complete(&mut events_b).await;
    assert_eq!(source_a.fetch_count(), 1);
    assert_eq!(source_b.fetch_count(), 1);
}

#[tokio::test]
async fn foreign_keys_are_ignored() {
    let bus = SignalBus::new();
    let (_engine, source) = instance("gamma", &bus);
    tokio::time::sleep(Duration::from_millis(50)).await;

    bus.publish("some_other_key");
    bus.publish("portal_theme_changed");
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(source.fetch_count(), 0);
}
