//! Liveness supervisor and provisioning-restart path.

use std::sync::Arc;

use webthing_node::app::credentials::CredentialStore;
use webthing_node::app::events::{AppEvent, RestartReason};
use webthing_node::app::portal::ProvisioningHandler;
use webthing_node::app::shared::SupervisorContext;
use webthing_node::app::supervisor::LivenessSupervisor;
use webthing_node::config::NodeConfig;

use crate::mock_ports::{MockClock, MockRadio, MockStore, MockSystem, RecordingSink};

type Supervisor = LivenessSupervisor<MockRadio, MockSystem, MockClock, RecordingSink>;

fn supervisor(shared: &Arc<SupervisorContext>) -> (Supervisor, MockSystem, MockClock, RecordingSink) {
    let system = MockSystem::default();
    let clock = MockClock::default();
    let sink = RecordingSink::default();
    let sup = LivenessSupervisor::new(
        shared.clone(),
        MockRadio::default(),
        system.clone(),
        clock.clone(),
        sink.clone(),
        &NodeConfig::default(),
    );
    (sup, system, clock, sink)
}

fn liveness_count(sink: &RecordingSink) -> usize {
    sink.count(|e| matches!(e, AppEvent::Liveness(_)))
}

#[test]
fn logs_only_when_heap_changes() {
    let shared = Arc::new(SupervisorContext::new());
    shared.mark_station_mode();
    let (mut sup, system, _, sink) = supervisor(&shared);

    assert!(sup.tick());
    assert!(sup.tick());
    assert_eq!(liveness_count(&sink), 1);

    system.set_free_heap(149_000);
    assert!(sup.tick());
    assert_eq!(liveness_count(&sink), 2);
}

#[test]
fn timezone_applied_once() {
    let shared = Arc::new(SupervisorContext::new());
    shared.mark_station_mode();
    let (mut sup, _, clock, _) = supervisor(&shared);

    for _ in 0..3 {
        sup.tick();
    }
    assert_eq!(*clock.timezone_sets.lock().unwrap(), ["CET"]);
}

#[test]
fn provisioning_mode_is_silent() {
    let shared = Arc::new(SupervisorContext::new());
    let (mut sup, _, clock, sink) = supervisor(&shared);

    assert!(sup.tick());
    assert!(sink.events().is_empty());
    assert!(clock.timezone_sets.lock().unwrap().is_empty());
}

#[test]
fn portal_submission_leads_to_restart() {
    let shared = Arc::new(SupervisorContext::new());
    let store = MockStore::default();
    let portal_sink = RecordingSink::default();
    let mut handler = ProvisioningHandler::new(
        shared.clone(),
        CredentialStore::new(store.clone()),
        portal_sink.clone(),
    );

    handler
        .accept("ssid=Home&pass=supersecret&mdns_host=thing1")
        .unwrap();
    assert!(shared.restart_pending());
    assert!(CredentialStore::new(store).load().is_some());

    let (mut sup, system, _, sink) = supervisor(&shared);
    assert!(!sup.tick());
    sup.shutdown();
    assert_eq!(system.restarts(), 1);
    assert_eq!(
        sink.events(),
        [AppEvent::Restarting(RestartReason::CredentialsProvisioned)]
    );
}

#[test]
fn rejected_submission_does_not_restart() {
    let shared = Arc::new(SupervisorContext::new());
    let store = MockStore::default();
    let mut handler = ProvisioningHandler::new(
        shared.clone(),
        CredentialStore::new(store.clone()),
        RecordingSink::default(),
    );

    assert!(handler.accept("ssid=Home&pass=supersecret").is_err());
    assert!(!shared.restart_pending());
    assert_eq!(store.commits(), 0);
}
