//! Bootstrap selector: decides once per boot between station mode and
//! provisioning mode, then performs the matching radio bring-up.
//!
//! A failed bring-up requests a recovery restart; the liveness
//! supervisor performs it.

use log::{error, info};

use super::credentials::{CredentialStore, NetworkCredentials};
use super::events::AppEvent;
use super::ports::{EventSink, KeyValueStore, NameAdvertiser, ProvisioningPortal, RadioPort};
use super::shared::SupervisorContext;
use crate::config::NodeConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    /// Join the stored network.
    Station,
    /// Serve an access point and wait for credentials.
    Provisioning,
}

/// Pure mode decision.
pub fn select_mode(credentials: Option<&NetworkCredentials>) -> BootMode {
    match credentials {
        Some(_) => BootMode::Station,
        None => BootMode::Provisioning,
    }
}

/// What bootstrap started, with the credentials when in station mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootPlan {
    Station(NetworkCredentials),
    Provisioning,
}

impl BootPlan {
    pub fn mode(&self) -> BootMode {
        match self {
            Self::Station(_) => BootMode::Station,
            Self::Provisioning => BootMode::Provisioning,
        }
    }
}

/// One-shot bring-up. Borrows the ports it drives; `main` keeps
/// ownership so the same adapters can be handed on afterwards.
pub struct Bootstrap<'a, R, N, P, E> {
    shared: &'a SupervisorContext,
    radio: &'a R,
    advertiser: &'a mut N,
    portal: &'a mut P,
    sink: &'a mut E,
    config: &'a NodeConfig,
}

impl<'a, R, N, P, E> Bootstrap<'a, R, N, P, E>
where
    R: RadioPort,
    N: NameAdvertiser,
    P: ProvisioningPortal,
    E: EventSink,
{
    pub fn new(
        shared: &'a SupervisorContext,
        radio: &'a R,
        advertiser: &'a mut N,
        portal: &'a mut P,
        sink: &'a mut E,
        config: &'a NodeConfig,
    ) -> Self {
        Self {
            shared,
            radio,
            advertiser,
            portal,
            sink,
            config,
        }
    }

    /// Read the credential store and bring the radio up accordingly.
    pub fn run<S: KeyValueStore>(mut self, store: &CredentialStore<S>) -> Result<BootPlan> {
        let plan = self.bring_up(store);
        if let Err(e) = &plan {
            error!("Bootstrap: bring-up failed ({}), restart scheduled", e);
            self.shared.request_recovery();
        }
        plan
    }

    fn bring_up<S: KeyValueStore>(&mut self, store: &CredentialStore<S>) -> Result<BootPlan> {
        let credentials = store.load();
        let mode = select_mode(credentials.as_ref());
        self.sink.emit(&AppEvent::ModeSelected(mode));

        match credentials {
            Some(credentials) => {
                // Latched before the radio starts so the first link
                // events reach the reactor queue.
                self.shared.mark_station_mode();
                self.radio.start_station(&credentials)?;
                info!(
                    "Bootstrap: station mode, joining '{}' as '{}'",
                    credentials.ssid(),
                    credentials.hostname()
                );
                Ok(BootPlan::Station(credentials))
            }
            None => {
                self.radio.start_access_point(&self.config.ap_ssid)?;
                if let Err(e) = self
                    .advertiser
                    .advertise(None, true, self.config.thing_port)
                {
                    error!("Bootstrap: mDNS advertisement failed ({})", e);
                }
                self.portal.start()?;
                info!(
                    "Bootstrap: provisioning mode, access point '{}'",
                    self.config.ap_ssid
                );
                Ok(BootPlan::Provisioning)
            }
        }
    }
}
