//! Forget-network button: ISR gate, press confirmation, erase, restart.

use std::sync::Arc;
use std::time::Duration;

use futures_lite::future::block_on;

use webthing_node::app::credentials::CredentialStore;
use webthing_node::app::events::{AppEvent, RestartReason};
use webthing_node::app::reset::{ResetOutcome, ResetTiming, ResetWorker, on_reset_edge};
use webthing_node::app::shared::SupervisorContext;
use webthing_node::app::supervisor::LivenessSupervisor;
use webthing_node::config::NodeConfig;
use webthing_node::fsm::ConnectionState;

use crate::mock_ports::{
    HeldButton, MockClock, MockRadio, MockStore, MockSystem, RadioCall, RecordingSink,
};

fn worker(
    shared: &Arc<SupervisorContext>,
    hold: Duration,
    store: &MockStore,
    sink: &RecordingSink,
) -> ResetWorker<HeldButton, MockStore, RecordingSink> {
    ResetWorker::new(
        shared.clone(),
        HeldButton::held_for(hold),
        CredentialStore::new(store.clone()),
        sink.clone(),
        ResetTiming::from(&NodeConfig::default()),
    )
}

#[test]
fn confirmed_press_erases_and_restarts_once() {
    let shared = Arc::new(SupervisorContext::new());
    let store = MockStore::credentials("Home", "supersecret", "thing1");
    let sink = RecordingSink::default();
    let mut worker = worker(&shared, Duration::from_millis(250), &store, &sink);

    assert!(on_reset_edge(&shared));
    assert_eq!(block_on(worker.handle_trigger()), ResetOutcome::Erased);

    assert!(store.is_empty());
    assert_eq!(store.commits(), 1);
    assert!(shared.reset_requested());
    assert!(shared.delete_button_ready());
    assert_eq!(sink.count(|e| *e == AppEvent::CredentialsErased), 1);

    // The liveness loop performs the restart.
    let radio = MockRadio::default();
    let system = MockSystem::default();
    let mut supervisor = LivenessSupervisor::new(
        shared.clone(),
        radio.clone(),
        system.clone(),
        MockClock::default(),
        sink.clone(),
        &NodeConfig::default(),
    );
    assert!(!supervisor.tick());
    supervisor.shutdown();

    assert_eq!(system.restarts(), 1);
    assert_eq!(radio.calls(), [RadioCall::Stop]);
    assert_eq!(
        sink.count(|e| *e == AppEvent::Restarting(RestartReason::CredentialsErased)),
        1
    );
}

#[test]
fn short_press_is_rejected() {
    let shared = Arc::new(SupervisorContext::new());
    let store = MockStore::credentials("Home", "supersecret", "thing1");
    let sink = RecordingSink::default();
    let mut worker = worker(&shared, Duration::from_millis(50), &store, &sink);

    assert!(on_reset_edge(&shared));
    assert!(!shared.delete_button_ready());
    assert_eq!(block_on(worker.handle_trigger()), ResetOutcome::Rejected);

    assert_eq!(store.removes(), 0);
    assert!(!store.is_empty());
    assert!(shared.delete_button_ready());
    assert!(!shared.reset_requested());
    assert!(sink.events().is_empty());
}

#[test]
fn bounces_during_cycle_are_dropped() {
    let shared = Arc::new(SupervisorContext::new());
    assert!(on_reset_edge(&shared));
    for _ in 0..10 {
        assert!(!on_reset_edge(&shared));
    }
    assert_eq!(shared.reset_triggers(), 1);
}

#[test]
fn worker_picks_up_trigger_from_interrupt_flag() {
    let shared = Arc::new(SupervisorContext::new());
    let store = MockStore::credentials("Home", "supersecret", "thing1");
    let sink = RecordingSink::default();
    let mut worker = worker(&shared, Duration::from_millis(250), &store, &sink);

    let isr = {
        let shared = shared.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            on_reset_edge(&shared)
        })
    };
    block_on(worker.wait_trigger());
    assert!(isr.join().unwrap());
    // The pending trigger is consumed exactly once.
    assert!(!shared.take_reset_trigger());
    assert_eq!(block_on(worker.handle_trigger()), ResetOutcome::Erased);
}

#[test]
fn failed_erase_keeps_node_running() {
    let shared = Arc::new(SupervisorContext::new());
    let store = MockStore::credentials("Home", "supersecret", "thing1");
    store.state.lock().unwrap().fail_commit = true;
    let sink = RecordingSink::default();
    let mut worker = worker(&shared, Duration::from_millis(250), &store, &sink);

    assert!(on_reset_edge(&shared));
    assert_eq!(block_on(worker.handle_trigger()), ResetOutcome::EraseFailed);

    assert!(!shared.reset_requested());
    assert!(shared.delete_button_ready());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::EraseFailed(_))),
        1
    );
}

#[test]
fn reset_during_station_mode_reports_link_state() {
    let shared = Arc::new(SupervisorContext::new());
    shared.mark_station_mode();
    shared.publish_link_status(ConnectionState::IpAcquired, 0);
    assert!(on_reset_edge(&shared));

    let sink = RecordingSink::default();
    let mut supervisor = LivenessSupervisor::new(
        shared.clone(),
        MockRadio::default(),
        MockSystem::default(),
        MockClock::default(),
        sink.clone(),
        &NodeConfig::default(),
    );
    assert!(supervisor.tick());
    let Some(AppEvent::Liveness(report)) = sink.events().pop() else {
        panic!("expected a liveness report");
    };
    assert_eq!(report.reset_triggers, 1);
    assert_eq!(report.link, ConnectionState::IpAcquired);
}
