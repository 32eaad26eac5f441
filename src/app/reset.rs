//! Reset control: the "forget network" button.
//!
//! Two halves. The interrupt half ([`on_reset_edge`]) runs in ISR
//! context and only flips atomics. The [`ResetWorker`] polls for a
//! pending trigger in its own task, confirms the press, erases the
//! stored credentials and requests a restart.
//!
//! ```text
//!  edge ─▶ ready? ─no─▶ drop
//!            │yes
//!            ▼
//!    ready=false, pending ─▶ wait confirm ─▶ still held? ─no─▶ ready=true
//!                                              │yes
//!                                              ▼
//!                                  erase ─ok─▶ ResetRequest=true
//!                                    │fail          │
//!                                    ▼              ▼
//!                              log  ─────▶ wait settle ─▶ ready=true, irq on
//! ```

use core::time::Duration;
use std::sync::Arc;

use async_io_mini::Timer;
use log::{debug, info, warn};

use super::credentials::CredentialStore;
use super::events::AppEvent;
use super::ports::{EventSink, KeyValueStore, ResetInput};
use super::shared::SupervisorContext;
use crate::config::NodeConfig;
use crate::drivers::task_pin::{self, Core};

/// Interrupt half. Returns `true` if the trigger was accepted.
///
/// Safe to call from ISR context: no blocking, no allocation.
pub fn on_reset_edge(shared: &SupervisorContext) -> bool {
    shared.try_claim_reset_trigger()
}

/// Result of one reset cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The input was released before the confirm window ended.
    Rejected,
    /// Credentials erased and restart requested.
    Erased,
    /// The erase failed; state unchanged.
    EraseFailed,
}

/// Press-confirm and release-settle windows, plus the trigger poll period.
#[derive(Debug, Clone, Copy)]
pub struct ResetTiming {
    pub confirm: Duration,
    pub settle: Duration,
    pub poll: Duration,
}

impl From<&NodeConfig> for ResetTiming {
    fn from(config: &NodeConfig) -> Self {
        Self {
            confirm: config.reset_confirm(),
            settle: config.reset_settle(),
            poll: config.reset_poll(),
        }
    }
}

/// Worker half of reset control.
pub struct ResetWorker<I, S, E> {
    shared: Arc<SupervisorContext>,
    input: I,
    credentials: CredentialStore<S>,
    sink: E,
    timing: ResetTiming,
}

impl<I, S, E> ResetWorker<I, S, E>
where
    I: ResetInput,
    S: KeyValueStore,
    E: EventSink,
{
    pub fn new(
        shared: Arc<SupervisorContext>,
        input: I,
        credentials: CredentialStore<S>,
        sink: E,
        timing: ResetTiming,
    ) -> Self {
        Self {
            shared,
            input,
            credentials,
            sink,
            timing,
        }
    }

    /// Process one accepted trigger.
    pub async fn handle_trigger(&mut self) -> ResetOutcome {
        Timer::after(self.timing.confirm).await;

        if !self.input.is_asserted() {
            debug!("Reset: released within {:?}, ignoring", self.timing.confirm);
            self.rearm();
            return ResetOutcome::Rejected;
        }

        info!("Reset: press confirmed, erasing credentials");
        let outcome = match self.credentials.erase() {
            Ok(()) => {
                self.shared.request_reset();
                self.sink.emit(&AppEvent::CredentialsErased);
                ResetOutcome::Erased
            }
            Err(e) => {
                warn!("Reset: erase failed ({}), press again to retry", e);
                self.sink.emit(&AppEvent::EraseFailed(e));
                ResetOutcome::EraseFailed
            }
        };

        Timer::after(self.timing.settle).await;
        self.rearm();
        outcome
    }

    /// Wait until the ISR has accepted a trigger.
    pub async fn wait_trigger(&self) {
        while !self.shared.take_reset_trigger() {
            Timer::after(self.timing.poll).await;
        }
    }

    /// Serve triggers forever.
    pub async fn run(mut self) {
        info!(
            "Reset worker ready (confirm={:?}, settle={:?})",
            self.timing.confirm, self.timing.settle
        );
        loop {
            self.wait_trigger().await;
            let outcome = self.handle_trigger().await;
            debug!("Reset: cycle finished ({:?})", outcome);
        }
    }

    fn rearm(&mut self) {
        self.shared.rearm_reset_trigger();
        self.input.rearm();
    }
}

impl<I, S, E> ResetWorker<I, S, E>
where
    I: ResetInput + Send + 'static,
    S: KeyValueStore + Send + 'static,
    E: EventSink + Send + 'static,
{
    /// Run the worker in a dedicated thread on the application core.
    pub fn spawn(self) -> std::io::Result<std::thread::JoinHandle<()>> {
        task_pin::spawn_on_core(Core::App, 6, 6, "reset\0", move || {
            futures_lite::future::block_on(self.run());
        })
    }
}
