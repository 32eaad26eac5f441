//! Link reactor and service activation against mock ports.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_io_mini::Timer;
use futures_lite::future::{self, block_on};

use webthing_node::app::events::AppEvent;
use webthing_node::app::gate::{GateSettings, ServiceActivationGate};
use webthing_node::app::link_task::LinkReactor;
use webthing_node::app::shared::{LINK_EVENT_DEPTH, SupervisorContext};
use webthing_node::config::NodeConfig;
use webthing_node::fsm::backoff::{BackoffPolicy, ExponentialBackoff, FixedBackoff};
use webthing_node::fsm::{ConnectionState, LinkEvent};

use crate::mock_ports::{MockRadio, MockServices, RecordingSink};

const ADDR: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 77);

type Reactor = LinkReactor<MockRadio, MockServices, MockServices, MockServices, RecordingSink>;

struct Rig {
    shared: Arc<SupervisorContext>,
    radio: MockRadio,
    services: MockServices,
    sink: RecordingSink,
}

fn rig() -> (Rig, Reactor) {
    rig_with(Box::new(FixedBackoff::default()))
}

fn rig_with(backoff: Box<dyn BackoffPolicy + Send>) -> (Rig, Reactor) {
    let shared = Arc::new(SupervisorContext::new());
    shared.mark_station_mode();
    let radio = MockRadio::default();
    let services = MockServices::default();
    let sink = RecordingSink::default();

    let settings = GateSettings {
        settle: Duration::from_millis(1),
        ..GateSettings::from(&NodeConfig::default())
    };
    let gate = ServiceActivationGate::new(
        shared.clone(),
        services.clone(),
        services.clone(),
        services.clone(),
        "thing1",
        settings,
    );
    let reactor = LinkReactor::new(
        shared.clone(),
        radio.clone(),
        gate,
        sink.clone(),
        backoff,
    );
    (
        Rig {
            shared,
            radio,
            services,
            sink,
        },
        reactor,
    )
}

fn transitions(sink: &RecordingSink) -> Vec<ConnectionState> {
    sink.events()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::LinkStateChanged { to, .. } => Some(to),
            _ => None,
        })
        .collect()
}

#[test]
fn link_start_enters_connecting() {
    let (rig, mut reactor) = rig();
    assert_eq!(reactor.state(), ConnectionState::Idle);

    block_on(reactor.handle(LinkEvent::LinkStart));

    assert_eq!(reactor.state(), ConnectionState::Connecting);
    assert_eq!(rig.radio.connects(), 1);
    assert_eq!(rig.shared.link_state(), ConnectionState::Connecting);
}

#[test]
fn three_drops_cycle_and_count() {
    let (rig, mut reactor) = rig();
    block_on(async {
        reactor.handle(LinkEvent::LinkStart).await;
        for _ in 0..3 {
            reactor.handle(LinkEvent::LinkDisconnected).await;
            reactor.handle(LinkEvent::RetryElapsed).await;
        }
    });

    assert_eq!(reactor.retry_counter(), 3);
    assert_eq!(rig.shared.retry_count(), 3);
    assert_eq!(
        transitions(&rig.sink),
        [
            ConnectionState::Connecting,
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
        ]
    );
    // Initial connect plus one per retry.
    assert_eq!(rig.radio.connects(), 4);
    let attempts: Vec<u32> = rig
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::ReconnectScheduled { attempt, delay_ms } => {
                assert_eq!(delay_ms, 1000);
                Some(attempt)
            }
            _ => None,
        })
        .collect();
    assert_eq!(attempts, [1, 2, 3]);
}

#[test]
fn address_activates_services_once() {
    let (rig, mut reactor) = rig();
    block_on(async {
        reactor.handle(LinkEvent::LinkStart).await;
        reactor.handle(LinkEvent::LinkConnected).await;
        reactor.handle(LinkEvent::AddressAcquired(ADDR)).await;
        // Drop and reacquire.
        reactor.handle(LinkEvent::LinkDisconnected).await;
        reactor.handle(LinkEvent::RetryElapsed).await;
        reactor.handle(LinkEvent::LinkConnected).await;
        reactor.handle(LinkEvent::AddressAcquired(ADDR)).await;
    });

    assert_eq!(reactor.state(), ConnectionState::IpAcquired);
    assert_eq!(reactor.retry_counter(), 0);
    assert!(rig.shared.services_active());
    assert_eq!(rig.services.server_starts(), 1);
    assert_eq!(rig.services.time_syncs(), 1);
    assert_eq!(
        rig.services.advertisements(),
        [(Some("thing1".into()), false, 8080)]
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ServicesActivated { .. })),
        1
    );
}

#[test]
fn address_clears_retry_counter() {
    let (_rig, mut reactor) = rig();
    block_on(async {
        reactor.handle(LinkEvent::LinkStart).await;
        reactor.handle(LinkEvent::LinkDisconnected).await;
        reactor.handle(LinkEvent::LinkDisconnected).await;
        assert_eq!(reactor.retry_counter(), 2);
        reactor.handle(LinkEvent::RetryElapsed).await;
        reactor.handle(LinkEvent::AddressAcquired(ADDR)).await;
    });
    assert_eq!(reactor.retry_counter(), 0);
}

#[test]
fn retry_timer_posts_retry_elapsed() {
    let shared = Arc::new(SupervisorContext::new());
    shared.mark_station_mode();
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    executor
        .spawn(webthing_node::app::link_task::retry_timer(shared.clone()))
        .detach();

    shared.schedule_retry(Duration::from_millis(10));
    let event = block_on(executor.run(shared.next_link_event()));
    assert_eq!(event, LinkEvent::RetryElapsed);
}

#[test]
fn retry_survives_full_event_queue() {
    let (rig, mut reactor) = rig_with(Box::new(FixedBackoff::new(Duration::from_millis(10))));
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    executor
        .spawn(webthing_node::app::link_task::retry_timer(rig.shared.clone()))
        .detach();

    let reconnected = block_on(executor.run(async {
        reactor.handle(LinkEvent::LinkStart).await;
        reactor.handle(LinkEvent::LinkDisconnected).await;
        // A burst of drops fills the queue before the retry fires.
        for _ in 0..LINK_EVENT_DEPTH {
            assert!(rig.shared.post_link_event(LinkEvent::LinkDisconnected));
        }
        Timer::after(Duration::from_millis(50)).await;

        let drain = async {
            while reactor.state() != ConnectionState::Connecting {
                let event = rig.shared.next_link_event().await;
                reactor.handle(event).await;
            }
            true
        };
        let give_up = async {
            Timer::after(Duration::from_secs(2)).await;
            false
        };
        future::or(drain, give_up).await
    }));

    assert!(reconnected, "link stayed in Disconnected");
    assert_eq!(reactor.retry_counter(), 1 + LINK_EVENT_DEPTH as u32);
    assert_eq!(rig.radio.connects(), 2);
}

#[test]
fn exponential_policy_spaces_retries() {
    let shared = Arc::new(SupervisorContext::new());
    shared.mark_station_mode();
    let services = MockServices::default();
    let sink = RecordingSink::default();
    let gate = ServiceActivationGate::new(
        shared.clone(),
        services.clone(),
        services.clone(),
        services,
        "thing1",
        GateSettings::from(&NodeConfig::default()),
    );
    let mut reactor = LinkReactor::new(
        shared,
        MockRadio::default(),
        gate,
        sink.clone(),
        Box::new(ExponentialBackoff::new(
            Duration::from_millis(500),
            Duration::from_secs(4),
        )),
    );
    block_on(async {
        reactor.handle(LinkEvent::LinkStart).await;
        for _ in 0..5 {
            reactor.handle(LinkEvent::LinkDisconnected).await;
            reactor.handle(LinkEvent::RetryElapsed).await;
        }
    });

    let delays: Vec<u32> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::ReconnectScheduled { delay_ms, .. } => Some(delay_ms),
            _ => None,
        })
        .collect();
    assert_eq!(delays, [500, 1000, 2000, 4000, 4000]);
}
