//! WiFi radio adapter.
//!
//! Implements [`RadioPort`] and turns driver notifications into
//! [`LinkEvent`]s posted to the shared supervisor context.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspWifi` from `esp-idf-svc` for
//!   configuration and start/stop; raw `esp_event_handler_instance_register`
//!   for `WIFI_EVENT` / `IP_EVENT` so every station event reaches the
//!   link queue unchanged.
//! - **all other targets**: simulation stubs that post the event sequence
//!   a healthy network would produce.
//!
//! Reconnection policy lives in the link state machine, not here.

use core::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use log::info;

use crate::app::credentials::NetworkCredentials;
use crate::app::ports::{RadioError, RadioPort};
use crate::app::shared::SupervisorContext;
use crate::fsm::LinkEvent;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Event translation
// ───────────────────────────────────────────────────────────────

/// Station-side driver notifications the supervisor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationEvent {
    Started,
    Stopped,
    Connected,
    Disconnected,
    GotIp(Ipv4Addr),
}

impl From<StationEvent> for LinkEvent {
    fn from(event: StationEvent) -> Self {
        match event {
            StationEvent::Started => Self::LinkStart,
            StationEvent::Stopped => Self::LinkStop,
            StationEvent::Connected => Self::LinkConnected,
            StationEvent::Disconnected => Self::LinkDisconnected,
            StationEvent::GotIp(addr) => Self::AddressAcquired(addr),
        }
    }
}

/// lwIP stores IPv4 addresses in network byte order inside a `u32`.
pub fn ipv4_from_lwip(addr: u32) -> Ipv4Addr {
    Ipv4Addr::from(addr.to_le_bytes())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

/// Cheaply cloneable handle on the radio.
#[derive(Clone)]
pub struct WifiRadio {
    shared: Arc<SupervisorContext>,
    #[cfg(target_os = "espidf")]
    driver: Arc<Mutex<EspWifi<'static>>>,
    #[cfg(not(target_os = "espidf"))]
    sim: Arc<Mutex<SimRadio>>,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimRadio {
    mode: Option<&'static str>,
    connects: u32,
}

#[cfg(target_os = "espidf")]
impl WifiRadio {
    /// Take the modem and register the station event handlers.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        shared: Arc<SupervisorContext>,
    ) -> Result<Self, RadioError> {
        let driver =
            EspWifi::new(modem, sysloop, Some(nvs)).map_err(|e| RadioError::Driver(e.code()))?;
        Self::register_handlers(&shared)?;
        info!("WiFi(espidf): driver ready");
        Ok(Self {
            shared,
            driver: Arc::new(Mutex::new(driver)),
        })
    }

    /// The context pointer is leaked: handlers stay registered for the
    /// lifetime of the process.
    fn register_handlers(shared: &Arc<SupervisorContext>) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;

        let arg = Arc::into_raw(Arc::clone(shared)) as *mut core::ffi::c_void;
        let mut wifi_instance: esp_event_handler_instance_t = core::ptr::null_mut();
        let mut ip_instance: esp_event_handler_instance_t = core::ptr::null_mut();

        let ret = unsafe {
            esp_event_handler_instance_register(
                WIFI_EVENT,
                ESP_EVENT_ANY_ID,
                Some(station_event_handler),
                arg,
                &mut wifi_instance,
            )
        };
        if ret != ESP_OK as esp_err_t {
            return Err(RadioError::Driver(ret));
        }
        let ret = unsafe {
            esp_event_handler_instance_register(
                IP_EVENT,
                ip_event_t_IP_EVENT_STA_GOT_IP as i32,
                Some(station_event_handler),
                arg,
                &mut ip_instance,
            )
        };
        if ret != ESP_OK as esp_err_t {
            return Err(RadioError::Driver(ret));
        }
        Ok(())
    }

    fn with_driver<T>(
        &self,
        f: impl FnOnce(&mut EspWifi<'static>) -> Result<T, esp_idf_svc::sys::EspError>,
    ) -> Result<T, RadioError> {
        let mut driver = self.driver.lock().map_err(|_| RadioError::Unavailable)?;
        f(&mut driver).map_err(|e| RadioError::Driver(e.code()))
    }
}

/// Raw event callback: translate and post. Runs on the event loop task.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn station_event_handler(
    arg: *mut core::ffi::c_void,
    base: esp_idf_svc::sys::esp_event_base_t,
    id: i32,
    data: *mut core::ffi::c_void,
) {
    use esp_idf_svc::sys::*;

    // SAFETY: `arg` is the context leaked in `register_handlers`.
    let shared = unsafe { &*(arg as *const SupervisorContext) };
    let id = id as u32;

    let event = if base == unsafe { WIFI_EVENT } {
        match id {
            x if x == wifi_event_t_WIFI_EVENT_STA_START => Some(StationEvent::Started),
            x if x == wifi_event_t_WIFI_EVENT_STA_STOP => Some(StationEvent::Stopped),
            x if x == wifi_event_t_WIFI_EVENT_STA_CONNECTED => Some(StationEvent::Connected),
            x if x == wifi_event_t_WIFI_EVENT_STA_DISCONNECTED => {
                Some(StationEvent::Disconnected)
            }
            _ => None,
        }
    } else if base == unsafe { IP_EVENT } && id == ip_event_t_IP_EVENT_STA_GOT_IP {
        // SAFETY: IP_EVENT_STA_GOT_IP carries an `ip_event_got_ip_t`.
        let got_ip = unsafe { &*(data as *const ip_event_got_ip_t) };
        Some(StationEvent::GotIp(ipv4_from_lwip(got_ip.ip_info.ip.addr)))
    } else {
        None
    };

    if let Some(event) = event {
        shared.post_link_event(event.into());
    }
}

#[cfg(target_os = "espidf")]
impl RadioPort for WifiRadio {
    fn start_station(&self, credentials: &NetworkCredentials) -> Result<(), RadioError> {
        let config = Configuration::Client(ClientConfiguration {
            ssid: credentials
                .ssid()
                .try_into()
                .map_err(|_| RadioError::InvalidConfig)?,
            password: credentials
                .passphrase()
                .try_into()
                .map_err(|_| RadioError::InvalidConfig)?,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        });
        self.with_driver(|wifi| {
            wifi.set_configuration(&config)?;
            wifi.start()
        })?;
        // Power save adds seconds of latency to inbound requests.
        let ret = unsafe {
            esp_idf_svc::sys::esp_wifi_set_ps(esp_idf_svc::sys::wifi_ps_type_t_WIFI_PS_NONE)
        };
        if ret != esp_idf_svc::sys::ESP_OK as esp_idf_svc::sys::esp_err_t {
            log::error!("WiFi(espidf): disabling power save failed ({})", ret);
        }
        info!("WiFi(espidf): station started for '{}'", credentials.ssid());
        Ok(())
    }

    fn start_access_point(&self, ssid: &str) -> Result<(), RadioError> {
        let config = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: ssid.try_into().map_err(|_| RadioError::InvalidConfig)?,
            auth_method: AuthMethod::None,
            channel: 1,
            max_connections: 4,
            ..Default::default()
        });
        self.with_driver(|wifi| {
            wifi.set_configuration(&config)?;
            wifi.start()
        })?;
        info!("WiFi(espidf): access point '{}' up", ssid);
        Ok(())
    }

    fn connect(&self) -> Result<(), RadioError> {
        self.with_driver(|wifi| wifi.connect())
    }

    fn stop(&self) -> Result<(), RadioError> {
        self.with_driver(|wifi| wifi.stop())
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl WifiRadio {
    /// Address handed out by the simulated DHCP server.
    pub const SIM_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);

    pub fn new(shared: Arc<SupervisorContext>) -> Self {
        info!("WiFi(sim): driver ready");
        Self {
            shared,
            sim: Arc::new(Mutex::new(SimRadio::default())),
        }
    }

    /// Current simulated mode, if started.
    pub fn mode(&self) -> Option<&'static str> {
        self.sim.lock().ok().and_then(|s| s.mode)
    }

    /// Simulate a driver event.
    pub fn inject(&self, event: StationEvent) -> bool {
        self.shared.post_link_event(event.into())
    }

    fn set_mode(&self, mode: Option<&'static str>) -> Result<(), RadioError> {
        let mut sim = self.sim.lock().map_err(|_| RadioError::Unavailable)?;
        sim.mode = mode;
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl RadioPort for WifiRadio {
    fn start_station(&self, credentials: &NetworkCredentials) -> Result<(), RadioError> {
        self.set_mode(Some("station"))?;
        info!("WiFi(sim): station started for '{}'", credentials.ssid());
        self.inject(StationEvent::Started);
        Ok(())
    }

    fn start_access_point(&self, ssid: &str) -> Result<(), RadioError> {
        if ssid.is_empty() || ssid.len() > 32 {
            return Err(RadioError::InvalidConfig);
        }
        self.set_mode(Some("access-point"))?;
        info!("WiFi(sim): access point '{}' up", ssid);
        Ok(())
    }

    fn connect(&self) -> Result<(), RadioError> {
        let attempt = {
            let mut sim = self.sim.lock().map_err(|_| RadioError::Unavailable)?;
            if sim.mode != Some("station") {
                return Err(RadioError::InvalidConfig);
            }
            sim.connects += 1;
            sim.connects
        };
        info!("WiFi(sim): connect attempt {}", attempt);
        self.inject(StationEvent::Connected);
        self.inject(StationEvent::GotIp(Self::SIM_ADDRESS));
        Ok(())
    }

    fn stop(&self) -> Result<(), RadioError> {
        let was_station = self.mode() == Some("station");
        self.set_mode(None)?;
        if was_station {
            self.inject(StationEvent::Stopped);
        }
        info!("WiFi(sim): stopped");
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
