//! Port traits: the hexagonal boundary between supervisor logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Bootstrap / LinkReactor / ResetWorker / Liveness
//! ```
//!
//! Driven adapters (radio, storage, network services, clocks) implement
//! these traits. The supervisor components consume them via generics, so
//! the connectivity logic never touches ESP-IDF directly and every flow
//! can be exercised on the host with mock ports.

use core::fmt;

use super::credentials::NetworkCredentials;
use super::events::AppEvent;
use crate::things::ThingHandle;

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// String key-value storage scoped to a single namespace.
///
/// Writes and removals are staged until [`commit`](Self::commit); only a
/// successful commit makes them durable.
pub trait KeyValueStore {
    /// Read a value. `Ok(None)` when the key is not present.
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stage a write.
    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Stage a removal. Returns `Ok(false)` if the key did not exist.
    fn remove(&mut self, key: &str) -> Result<bool, StorageError>;

    /// Make every staged change durable.
    fn commit(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain → WiFi driver)
// ───────────────────────────────────────────────────────────────

/// Control surface of the WiFi radio.
///
/// Link events flow the other way: the adapter posts them into the
/// shared [`SupervisorContext`](super::shared::SupervisorContext).
/// Methods take `&self` because the radio is shared between the main
/// task (bring-up and shutdown) and the link task (reconnects).
pub trait RadioPort {
    /// Configure station mode with `credentials` and start the radio.
    fn start_station(&self, credentials: &NetworkCredentials) -> Result<(), RadioError>;

    /// Start an open access point broadcasting `ssid`.
    fn start_access_point(&self, ssid: &str) -> Result<(), RadioError>;

    /// Ask the driver to (re)associate. Non-blocking; the outcome arrives
    /// as a link event.
    fn connect(&self) -> Result<(), RadioError>;

    /// Stop the radio.
    fn stop(&self) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Network service ports (driven adapters: domain → servers)
// ───────────────────────────────────────────────────────────────

/// The thing protocol server. Its wire protocol lives outside this crate.
pub trait ThingServerPort {
    fn init_root_node(&mut self);

    fn register_thing(&mut self, thing: ThingHandle) -> Result<(), ServiceError>;

    fn start_server(&mut self, port: u16, hostname: &str, domain: &str)
    -> Result<(), ServiceError>;
}

/// mDNS name advertisement. `hostname` is `None` in access-point mode.
pub trait NameAdvertiser {
    fn advertise(
        &mut self,
        hostname: Option<&str>,
        access_point: bool,
        port: u16,
    ) -> Result<(), ServiceError>;
}

/// Wall-clock synchronisation (SNTP).
pub trait TimeSyncPort {
    fn start(&mut self, server: &str) -> Result<(), ServiceError>;
}

/// The provisioning portal served while in access-point mode.
pub trait ProvisioningPortal {
    fn start(&mut self) -> Result<(), ServiceError>;
}

// ───────────────────────────────────────────────────────────────
// System ports
// ───────────────────────────────────────────────────────────────

/// Chip-level services.
pub trait SystemPort {
    /// Free 8-bit-capable heap in bytes.
    fn free_heap(&self) -> u32;

    /// Reboot the device. Does not return on hardware.
    fn restart(&self);
}

/// Local wall clock.
pub trait ClockPort {
    /// Apply a POSIX TZ string.
    fn set_timezone(&mut self, tz: &str);

    /// Current local time formatted `YYYY/MM/DD HH:MM:SS`.
    fn local_timestamp(&self) -> String;
}

/// The physical "forget network" input.
pub trait ResetInput {
    /// Sample the level. `true` while the button is held.
    fn is_asserted(&mut self) -> bool;

    /// Re-enable edge detection after a reset cycle.
    fn rearm(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The supervisor emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go (serial log, test recorder, ...).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`KeyValueStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// The namespace could not be opened.
    OpenFailed,
    /// A stored value could not be read.
    ReadFailed,
    /// A write or erase was rejected.
    WriteFailed,
    /// Staged changes could not be made durable.
    CommitFailed,
}

/// Errors from [`RadioPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Credentials or AP identity do not fit the driver configuration.
    InvalidConfig,
    /// The driver lock was poisoned by a panicking thread.
    Unavailable,
    /// Raw `esp_err_t` from the driver.
    Driver(i32),
}

/// Errors from the network service ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    /// The service refused to start. The string names the failing step.
    StartFailed(&'static str),
    /// Raw `esp_err_t` from the service.
    Driver(i32),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::OpenFailed => write!(f, "namespace open failed"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::CommitFailed => write!(f, "commit failed"),
        }
    }
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig => write!(f, "invalid radio configuration"),
            Self::Unavailable => write!(f, "radio driver unavailable"),
            Self::Driver(code) => write!(f, "driver error {code}"),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartFailed(step) => write!(f, "start failed: {step}"),
            Self::Driver(code) => write!(f, "driver error {code}"),
        }
    }
}
