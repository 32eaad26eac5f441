//! Liveness supervisor.
//!
//! Runs on the main task for the lifetime of the process. Every interval
//! it checks whether a restart was requested; if so it stops the radio
//! and reboots. Otherwise, in station mode, it logs a timestamped health
//! line whenever free heap changes.

use core::time::Duration;
use std::sync::Arc;

use log::{info, warn};

use super::events::{AppEvent, LivenessReport, RestartReason};
use super::ports::{ClockPort, EventSink, RadioPort, SystemPort};
use super::shared::SupervisorContext;
use crate::config::NodeConfig;

pub struct LivenessSupervisor<R, Y, K, E> {
    shared: Arc<SupervisorContext>,
    radio: R,
    system: Y,
    clock: K,
    sink: E,
    timezone: String,
    interval: Duration,
    timezone_applied: bool,
    last_free_heap: Option<u32>,
}

impl<R, Y, K, E> LivenessSupervisor<R, Y, K, E>
where
    R: RadioPort,
    Y: SystemPort,
    K: ClockPort,
    E: EventSink,
{
    pub fn new(
        shared: Arc<SupervisorContext>,
        radio: R,
        system: Y,
        clock: K,
        sink: E,
        config: &NodeConfig,
    ) -> Self {
        Self {
            shared,
            radio,
            system,
            clock,
            sink,
            timezone: config.timezone.clone(),
            interval: config.liveness_interval(),
            timezone_applied: false,
            last_free_heap: None,
        }
    }

    /// One supervision step. Returns `false` once a restart is due.
    pub fn tick(&mut self) -> bool {
        if self.shared.should_stop() {
            return false;
        }
        if !self.shared.is_station_mode() {
            return true;
        }

        if !self.timezone_applied {
            self.clock.set_timezone(&self.timezone);
            self.timezone_applied = true;
        }

        let free_heap = self.system.free_heap();
        if self.last_free_heap != Some(free_heap) {
            self.last_free_heap = Some(free_heap);
            self.sink.emit(&AppEvent::Liveness(LivenessReport {
                timestamp: self.clock.local_timestamp(),
                free_heap,
                reset_triggers: self.shared.reset_triggers(),
                link: self.shared.link_state(),
                retry_count: self.shared.retry_count(),
            }));
        }
        true
    }

    /// Stop the radio and reboot.
    pub fn shutdown(&mut self) {
        let reason = if self.shared.reset_requested() {
            RestartReason::CredentialsErased
        } else if self.shared.recovery_requested() {
            RestartReason::BringUpFailed
        } else {
            RestartReason::CredentialsProvisioned
        };
        self.sink.emit(&AppEvent::Restarting(reason));
        if let Err(e) = self.radio.stop() {
            warn!("Liveness: radio stop failed ({}), restarting anyway", e);
        }
        self.system.restart();
    }

    /// Supervise until a restart is requested, then perform it.
    pub fn run(mut self) {
        info!("Liveness supervisor running every {:?}", self.interval);
        loop {
            std::thread::sleep(self.interval);
            if !self.tick() {
                break;
            }
        }
        self.shutdown();
    }
}
