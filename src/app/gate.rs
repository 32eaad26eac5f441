//! Service activation gate.
//!
//! Network services are started exactly once per boot, on the first
//! address acquisition. Later acquisitions (lease renewals, reconnects)
//! pass through the gate without effect.

use core::net::Ipv4Addr;
use core::time::Duration;
use std::sync::Arc;

use async_io_mini::Timer;
use log::{debug, error, info};

use super::ports::{NameAdvertiser, ThingServerPort, TimeSyncPort};
use super::shared::SupervisorContext;
use crate::config::NodeConfig;

/// Where and how services are started.
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub port: u16,
    pub domain: String,
    pub time_server: String,
    /// Yield between address assignment and server bind.
    pub settle: Duration,
}

impl From<&NodeConfig> for GateSettings {
    fn from(config: &NodeConfig) -> Self {
        Self {
            port: config.thing_port,
            domain: config.mdns_domain.clone(),
            time_server: config.time_server.clone(),
            settle: config.address_settle(),
        }
    }
}

pub struct ServiceActivationGate<T, N, C> {
    shared: Arc<SupervisorContext>,
    server: T,
    advertiser: N,
    time_sync: C,
    hostname: String,
    settings: GateSettings,
}

impl<T, N, C> ServiceActivationGate<T, N, C>
where
    T: ThingServerPort,
    N: NameAdvertiser,
    C: TimeSyncPort,
{
    pub fn new(
        shared: Arc<SupervisorContext>,
        server: T,
        advertiser: N,
        time_sync: C,
        hostname: &str,
        settings: GateSettings,
    ) -> Self {
        Self {
            shared,
            server,
            advertiser,
            time_sync,
            hostname: hostname.into(),
            settings,
        }
    }

    pub fn port(&self) -> u16 {
        self.settings.port
    }

    /// Start services if this is the first activation.
    ///
    /// Returns `true` when this call performed the activation. Step
    /// failures are logged and the remaining steps still run.
    pub async fn activate_once(&mut self, address: Ipv4Addr) -> bool {
        if !self.shared.try_activate() {
            debug!("Gate: services already active, ignoring {}", address);
            return false;
        }

        Timer::after(self.settings.settle).await;

        let port = self.settings.port;
        if let Err(e) = self
            .server
            .start_server(port, &self.hostname, &self.settings.domain)
        {
            error!("Gate: thing server failed to start ({})", e);
        }
        if let Err(e) = self.advertiser.advertise(Some(&self.hostname), false, port) {
            error!("Gate: mDNS advertisement failed ({})", e);
        }
        if let Err(e) = self.time_sync.start(&self.settings.time_server) {
            error!("Gate: time sync failed to start ({})", e);
        }

        info!(
            "Gate: services up at http://{}.{}:{} ({})",
            self.hostname, self.settings.domain, port, address
        );
        true
    }
}
