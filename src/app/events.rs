//! Outbound supervisor events.
//!
//! Every component emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them (serial log, test recorder).

use core::net::Ipv4Addr;

use super::bootstrap::BootMode;
use super::ports::StorageError;
use crate::fsm::ConnectionState;

/// Structured events emitted by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Bootstrap picked a mode.
    ModeSelected(BootMode),

    /// The link state machine transitioned.
    LinkStateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// The link dropped and a reconnect is pending.
    ReconnectScheduled { attempt: u32, delay_ms: u32 },

    /// Thing server, mDNS and SNTP were started.
    ServicesActivated { address: Ipv4Addr, port: u16 },

    /// Credentials were erased by the reset button.
    CredentialsErased,

    /// A confirmed reset could not erase the credentials.
    EraseFailed(StorageError),

    /// The provisioning portal stored a new credential set.
    CredentialsProvisioned { ssid: heapless::String<32> },

    /// Periodic health snapshot.
    Liveness(LivenessReport),

    /// The node is about to reboot.
    Restarting(RestartReason),
}

/// A point-in-time health snapshot, emitted when free heap changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessReport {
    pub timestamp: String,
    pub free_heap: u32,
    pub reset_triggers: u32,
    pub link: ConnectionState,
    pub retry_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// Forget-network button erased the credentials.
    CredentialsErased,
    /// Provisioning portal saved new credentials.
    CredentialsProvisioned,
    /// Radio or portal bring-up failed at boot.
    BringUpFailed,
}
