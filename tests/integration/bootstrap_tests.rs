//! Bootstrap selection from stored credentials.

use std::sync::Arc;

use webthing_node::app::bootstrap::{BootMode, BootPlan, Bootstrap};
use webthing_node::app::credentials::CredentialStore;
use webthing_node::app::events::{AppEvent, RestartReason};
use webthing_node::app::supervisor::LivenessSupervisor;
use webthing_node::app::shared::SupervisorContext;
use webthing_node::config::NodeConfig;

use crate::mock_ports::{
    MockClock, MockRadio, MockServices, MockStore, MockSystem, RadioCall, RecordingSink,
};

struct Rig {
    shared: Arc<SupervisorContext>,
    radio: MockRadio,
    services: MockServices,
    sink: RecordingSink,
    config: NodeConfig,
}

impl Rig {
    fn new() -> Self {
        Self {
            shared: Arc::new(SupervisorContext::new()),
            radio: MockRadio::default(),
            services: MockServices::default(),
            sink: RecordingSink::default(),
            config: NodeConfig::default(),
        }
    }

    fn boot(&mut self, store: MockStore) -> BootPlan {
        self.try_boot(store).unwrap()
    }

    fn try_boot(&mut self, store: MockStore) -> webthing_node::error::Result<BootPlan> {
        let mut advertiser = self.services.clone();
        let mut portal = self.services.clone();
        Bootstrap::new(
            &self.shared,
            &self.radio,
            &mut advertiser,
            &mut portal,
            &mut self.sink,
            &self.config,
        )
        .run(&CredentialStore::new(store))
    }
}

#[test]
fn valid_credentials_start_station_mode() {
    let mut rig = Rig::new();
    let plan = rig.boot(MockStore::credentials("Home", "supersecret", "thing1"));

    let BootPlan::Station(creds) = plan else {
        panic!("expected station mode");
    };
    assert_eq!(creds.hostname(), "thing1");
    assert!(rig.shared.is_station_mode());
    assert_eq!(rig.radio.calls(), [RadioCall::StartStation("Home".into())]);
    assert_eq!(rig.services.portal_starts(), 0);
    assert_eq!(
        rig.sink.events(),
        [AppEvent::ModeSelected(BootMode::Station)]
    );
}

#[test]
fn empty_ssid_starts_provisioning_mode() {
    let mut rig = Rig::new();
    let plan = rig.boot(MockStore::credentials("", "supersecret", "thing1"));

    assert_eq!(plan.mode(), BootMode::Provisioning);
    assert!(!rig.shared.is_station_mode());
    assert_eq!(
        rig.radio.calls(),
        [RadioCall::StartAccessPoint(rig.config.ap_ssid.clone())]
    );
    assert_eq!(rig.services.portal_starts(), 1);
    assert_eq!(
        rig.services.advertisements(),
        [(None, true, rig.config.thing_port)]
    );
}

#[test]
fn partial_credentials_are_absent() {
    let mut rig = Rig::new();
    let plan = rig.boot(MockStore::with(&[("ssid", "Home"), ("pass", "supersecret")]));
    assert_eq!(plan.mode(), BootMode::Provisioning);
}

#[test]
fn oversized_ssid_is_absent() {
    let mut rig = Rig::new();
    let long = "s".repeat(33);
    let plan = rig.boot(MockStore::credentials(&long, "supersecret", "thing1"));
    assert_eq!(plan.mode(), BootMode::Provisioning);
}

#[test]
fn station_mode_lets_link_events_through() {
    let mut rig = Rig::new();
    rig.boot(MockStore::credentials("Home", "supersecret", "thing1"));
    assert!(rig.shared.post_link_event(webthing_node::fsm::LinkEvent::LinkStart));
}

#[test]
fn provisioning_mode_drops_link_events() {
    let mut rig = Rig::new();
    rig.boot(MockStore::default());
    assert!(!rig.shared.post_link_event(webthing_node::fsm::LinkEvent::LinkStart));
}

#[test]
fn failed_station_start_restarts_node() {
    let mut rig = Rig::new();
    rig.radio = MockRadio::failing();
    assert!(
        rig.try_boot(MockStore::credentials("Home", "supersecret", "thing1"))
            .is_err()
    );
    assert!(rig.shared.recovery_requested());

    let system = MockSystem::default();
    let sink = RecordingSink::default();
    let mut supervisor = LivenessSupervisor::new(
        rig.shared.clone(),
        rig.radio.clone(),
        system.clone(),
        MockClock::default(),
        sink.clone(),
        &rig.config,
    );
    assert!(!supervisor.tick());
    supervisor.shutdown();
    assert_eq!(system.restarts(), 1);
    assert_eq!(
        sink.events(),
        [AppEvent::Restarting(RestartReason::BringUpFailed)]
    );
}

#[test]
fn failed_access_point_start_skips_portal() {
    let mut rig = Rig::new();
    rig.radio = MockRadio::failing();
    assert!(rig.try_boot(MockStore::default()).is_err());
    assert_eq!(rig.services.portal_starts(), 0);
    assert!(rig.shared.recovery_requested());
    assert!(!rig.shared.reset_requested());
}
