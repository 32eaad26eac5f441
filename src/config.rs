//! Node configuration parameters
//!
//! All tunable parameters for the connectivity supervisor: service
//! endpoints, provisioning identity, and every timing constant used by
//! the reset, reconnect and liveness paths.

use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::fsm::backoff::{BackoffPolicy, ExponentialBackoff, FixedBackoff};

/// Core node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Services ---
    /// TCP port the thing protocol server listens on
    pub thing_port: u16,
    /// mDNS domain appended to the advertised hostname
    pub mdns_domain: String,
    /// SNTP server polled once the network is up
    pub time_server: String,
    /// POSIX TZ string applied before the first timestamped log line
    pub timezone: String,

    // --- Provisioning ---
    /// SSID broadcast while waiting for credentials
    pub ap_ssid: String,
    /// Hostname advertised while in access-point mode
    pub ap_hostname: String,
    /// NVS namespace holding the network credentials
    pub storage_namespace: String,

    // --- Timing ---
    /// Delay between a link drop and the next connection attempt (milliseconds)
    pub reconnect_delay_ms: u32,
    /// Upper bound for exponential reconnect backoff; at or below
    /// `reconnect_delay_ms` the delay is fixed (milliseconds)
    pub reconnect_delay_max_ms: u32,
    /// Press-confirm window before the reset input is re-sampled (milliseconds)
    pub reset_confirm_ms: u32,
    /// Release-settle window before the reset input is re-armed (milliseconds)
    pub reset_settle_ms: u32,
    /// How often the reset worker checks for an accepted trigger (milliseconds)
    pub reset_poll_ms: u32,
    /// Yield between address assignment and server bind (milliseconds)
    pub address_settle_ms: u32,
    /// Liveness supervisor cadence (milliseconds)
    pub liveness_interval_ms: u32,
    /// Pause after thing registration before network bring-up (milliseconds)
    pub boot_settle_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Services
            thing_port: 8080,
            mdns_domain: "local".into(),
            time_server: "pool.ntp.org".into(),
            timezone: "CET".into(),

            // Provisioning
            ap_ssid: "WebThing-Setup".into(),
            ap_hostname: "webthing".into(),
            storage_namespace: "storage".into(),

            // Timing
            reconnect_delay_ms: 1000,
            reconnect_delay_max_ms: 1000,
            reset_confirm_ms: 200,
            reset_settle_ms: 1000,
            reset_poll_ms: 20,
            address_settle_ms: 50,
            liveness_interval_ms: 2000, // 0.5 Hz
            boot_settle_ms: 100,
        }
    }
}

impl NodeConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.into())
    }

    /// Reconnect policy for the link reactor.
    pub fn backoff_policy(&self) -> Box<dyn BackoffPolicy + Send> {
        if self.reconnect_delay_max_ms > self.reconnect_delay_ms {
            Box::new(ExponentialBackoff::new(
                self.reconnect_delay(),
                Duration::from_millis(self.reconnect_delay_max_ms.into()),
            ))
        } else {
            Box::new(FixedBackoff::new(self.reconnect_delay()))
        }
    }

    pub fn reset_confirm(&self) -> Duration {
        Duration::from_millis(self.reset_confirm_ms.into())
    }

    pub fn reset_settle(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms.into())
    }

    pub fn reset_poll(&self) -> Duration {
        Duration::from_millis(self.reset_poll_ms.into())
    }

    pub fn address_settle(&self) -> Duration {
        Duration::from_millis(self.address_settle_ms.into())
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms.into())
    }

    pub fn boot_settle(&self) -> Duration {
        Duration::from_millis(self.boot_settle_ms.into())
    }
}
