//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing supervisor events to the ESP-IDF
//! logger (UART / USB-CDC in production) as tagged one-line records.

use log::{info, warn};

use crate::app::events::{AppEvent, RestartReason};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Render an event as its log line.
pub fn render(event: &AppEvent) -> String {
    match event {
        AppEvent::ModeSelected(mode) => format!("MODE | {:?}", mode),
        AppEvent::LinkStateChanged { from, to } => format!("LINK | {:?} -> {:?}", from, to),
        AppEvent::ReconnectScheduled { attempt, delay_ms } => {
            format!("RETRY | attempt={} in {}ms", attempt, delay_ms)
        }
        AppEvent::ServicesActivated { address, port } => {
            format!("SERVICES | up at {}:{}", address, port)
        }
        AppEvent::CredentialsErased => "RESET | credentials erased".into(),
        AppEvent::EraseFailed(e) => format!("RESET | erase failed: {}", e),
        AppEvent::CredentialsProvisioned { ssid } => format!("PORTAL | saved network '{}'", ssid),
        AppEvent::Liveness(r) => format!(
            "ALIVE | {} | free heap: {} | irq: {} | link={:?} retries={}",
            r.timestamp, r.free_heap, r.reset_triggers, r.link, r.retry_count
        ),
        AppEvent::Restarting(reason) => match reason {
            RestartReason::CredentialsErased => "RESTART | credentials erased".into(),
            RestartReason::CredentialsProvisioned => "RESTART | new credentials".into(),
            RestartReason::BringUpFailed => "RESTART | bring-up failed".into(),
        },
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::EraseFailed(_) => warn!("{}", render(event)),
            _ => info!("{}", render(event)),
        }
    }
}
