//! WebThing node firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │  WifiRadio  NvsStore  MdnsAdvertiser  SntpTimeSync           │
//! │  HttpPortal ThingRegistry  EspResetButton  LogEventSink      │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ───────────────         │
//! │                                                              │
//! │  Bootstrap ─▶ LinkReactor (link task) ─▶ ActivationGate      │
//! │  ResetWorker (reset task)   LivenessSupervisor (main task)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::{Context, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::IOPin;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use webthing_node::adapters::log_sink::LogEventSink;
use webthing_node::adapters::mdns::MdnsAdvertiser;
use webthing_node::adapters::nvs::NvsStore;
use webthing_node::adapters::portal::HttpPortal;
use webthing_node::adapters::reset_input::EspResetButton;
use webthing_node::adapters::sntp::SntpTimeSync;
use webthing_node::adapters::system::SystemAdapter;
use webthing_node::adapters::thing_server::ThingRegistry;
use webthing_node::adapters::time::ClockAdapter;
use webthing_node::adapters::wifi::WifiRadio;
use webthing_node::app::bootstrap::{BootPlan, Bootstrap};
use webthing_node::app::credentials::CredentialStore;
use webthing_node::app::gate::ServiceActivationGate;
use webthing_node::app::link_task::{self, LinkReactor};
use webthing_node::app::portal::ProvisioningHandler;
use webthing_node::app::reset::ResetWorker;
use webthing_node::app::shared::SupervisorContext;
use webthing_node::app::supervisor::LivenessSupervisor;
use webthing_node::config::NodeConfig;
use webthing_node::error::Error;
use webthing_node::things;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("WebThing node v{}", env!("CARGO_PKG_VERSION"));

    let config = NodeConfig::default();
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let system = SystemAdapter::new();
    system.log_chip_info();

    let shared = Arc::new(SupervisorContext::new());
    let nvs = NvsStore::new(&config.storage_namespace).map_err(Error::from)?;

    // ── 2. Reset control ──────────────────────────────────────
    let button = EspResetButton::new(peripherals.pins.gpio0.downgrade(), shared.clone())
        .context("reset button")?;
    ResetWorker::new(
        shared.clone(),
        button,
        CredentialStore::new(nvs.clone()),
        LogEventSink::new(),
        (&config).into(),
    )
    .spawn()
    .context("reset task")?;

    // ── 3. Things ─────────────────────────────────────────────
    let mut registry = ThingRegistry::new();
    let count = things::register_all(&mut registry).map_err(Error::from)?;
    info!("Registered {} things", count);
    std::thread::sleep(config.boot_settle());

    // ── 4. Bring-up ───────────────────────────────────────────
    let radio = WifiRadio::new(peripherals.modem, sysloop, nvs_partition, shared.clone())
        .map_err(Error::from)?;
    let mut advertiser = MdnsAdvertiser::new(&config.ap_hostname).map_err(Error::from)?;
    let mut portal = HttpPortal::new(
        ProvisioningHandler::new(
            shared.clone(),
            CredentialStore::new(nvs.clone()),
            LogEventSink::new(),
        ),
        config.thing_port,
    );
    let mut sink = LogEventSink::new();

    let plan = Bootstrap::new(
        &shared,
        &radio,
        &mut advertiser,
        &mut portal,
        &mut sink,
        &config,
    )
    .run(&CredentialStore::new(nvs));

    match plan {
        Ok(BootPlan::Station(credentials)) => {
            let gate = ServiceActivationGate::new(
                shared.clone(),
                registry,
                advertiser,
                SntpTimeSync::new(),
                credentials.hostname(),
                (&config).into(),
            );
            let reactor = LinkReactor::new(
                shared.clone(),
                radio.clone(),
                gate,
                LogEventSink::new(),
                config.backoff_policy(),
            );
            link_task::spawn(reactor).context("link task")?;
        }
        Ok(BootPlan::Provisioning) => {
            warn!("No usable credentials; waiting for provisioning");
        }
        // Logged by bootstrap; the supervisor below performs the restart.
        Err(_) => {}
    }

    // ── 5. Supervise until restart ────────────────────────────
    // `portal` must outlive the loop: it owns the HTTP server.
    let _portal = portal;
    LivenessSupervisor::new(
        shared,
        radio,
        system,
        ClockAdapter::new(),
        LogEventSink::new(),
        &config,
    )
    .run();

    Ok(())
}
