//! State shared between the supervisor tasks.
//!
//! One [`SupervisorContext`] is created in `main`, wrapped in an `Arc`,
//! and handed to every task at spawn time. Flags are plain atomics; the
//! inter-task queues are `embassy-sync` primitives so both blocking
//! threads and async executors can use them. The reset ISR only touches
//! atomics; waking a parked thread from interrupt context is not allowed.
//!
//! ```text
//!  WiFi driver ──LinkEvent──▶ link_events ──▶ LinkReactor
//!  LinkReactor ──delay──────▶ retry_timer ──▶ retry task ──RetryElapsed──▶ link_events
//!  GPIO ISR    ──store──────▶ reset_pending ◀──poll── ResetWorker
//! ```

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::{debug, warn};

use crate::fsm::{ConnectionState, LinkEvent};

/// Depth of the link event queue.
pub const LINK_EVENT_DEPTH: usize = 8;

pub struct SupervisorContext {
    station_mode: AtomicBool,
    services_active: AtomicBool,
    reset_requested: AtomicBool,
    restart_pending: AtomicBool,
    recovery_requested: AtomicBool,
    delete_button_ready: AtomicBool,
    reset_pending: AtomicBool,
    reset_triggers: AtomicU32,
    retry_count: AtomicU32,
    link_state: AtomicU8,
    link_events: Channel<CriticalSectionRawMutex, LinkEvent, LINK_EVENT_DEPTH>,
    retry_timer: Signal<CriticalSectionRawMutex, Duration>,
}

impl Default for SupervisorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SupervisorContext {
    pub const fn new() -> Self {
        Self {
            station_mode: AtomicBool::new(false),
            services_active: AtomicBool::new(false),
            reset_requested: AtomicBool::new(false),
            restart_pending: AtomicBool::new(false),
            recovery_requested: AtomicBool::new(false),
            delete_button_ready: AtomicBool::new(true),
            reset_pending: AtomicBool::new(false),
            reset_triggers: AtomicU32::new(0),
            retry_count: AtomicU32::new(0),
            link_state: AtomicU8::new(ConnectionState::Idle as u8),
            link_events: Channel::new(),
            retry_timer: Signal::new(),
        }
    }

    // ── Boot mode ─────────────────────────────────────────────

    /// Latch station mode. Must precede radio start so the first link
    /// events are not dropped.
    pub fn mark_station_mode(&self) {
        self.station_mode.store(true, Ordering::Release);
    }

    pub fn is_station_mode(&self) -> bool {
        self.station_mode.load(Ordering::Acquire)
    }

    // ── Activation flag ───────────────────────────────────────

    /// Flip the activation flag. `true` for exactly one caller.
    pub fn try_activate(&self) -> bool {
        self.services_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn services_active(&self) -> bool {
        self.services_active.load(Ordering::Acquire)
    }

    // ── Restart requests ──────────────────────────────────────

    /// Credentials were erased; the node must restart into provisioning.
    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::Release);
    }

    pub fn reset_requested(&self) -> bool {
        self.reset_requested.load(Ordering::Acquire)
    }

    /// New credentials were committed; the node must restart into station mode.
    pub fn request_restart(&self) {
        self.restart_pending.store(true, Ordering::Release);
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending.load(Ordering::Acquire)
    }

    /// Radio or portal bring-up failed; only a reboot recovers.
    pub fn request_recovery(&self) {
        self.recovery_requested.store(true, Ordering::Release);
    }

    pub fn recovery_requested(&self) -> bool {
        self.recovery_requested.load(Ordering::Acquire)
    }

    /// Any restart reason is set.
    pub fn should_stop(&self) -> bool {
        self.reset_requested() || self.restart_pending() || self.recovery_requested()
    }

    // ── Reset trigger gate ────────────────────────────────────

    /// Claim the reset pathway from interrupt context.
    ///
    /// Only succeeds while the pathway is ready; a claim clears readiness
    /// and marks a trigger pending for the worker. Atomics only.
    pub fn try_claim_reset_trigger(&self) -> bool {
        if self
            .delete_button_ready
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.reset_triggers.fetch_add(1, Ordering::Relaxed);
        self.reset_pending.store(true, Ordering::Release);
        true
    }

    /// Make the reset pathway accept the next trigger.
    pub fn rearm_reset_trigger(&self) {
        self.delete_button_ready.store(true, Ordering::Release);
    }

    pub fn delete_button_ready(&self) -> bool {
        self.delete_button_ready.load(Ordering::Acquire)
    }

    /// Triggers accepted since boot.
    pub fn reset_triggers(&self) -> u32 {
        self.reset_triggers.load(Ordering::Relaxed)
    }

    /// Consume a pending trigger. Worker side.
    pub fn take_reset_trigger(&self) -> bool {
        self.reset_pending.swap(false, Ordering::AcqRel)
    }

    // ── Link events ───────────────────────────────────────────

    /// Queue a link event for the reactor.
    ///
    /// Dropped when station mode is not selected or the queue is full.
    pub fn post_link_event(&self, event: LinkEvent) -> bool {
        if !self.is_station_mode() {
            debug!("Link: {:?} dropped, not in station mode", event);
            return false;
        }
        if self.link_events.try_send(event).is_err() {
            warn!("Link: event queue full, dropping {:?}", event);
            return false;
        }
        true
    }

    /// Queue a link event, waiting for room instead of dropping it.
    pub async fn send_link_event(&self, event: LinkEvent) {
        if !self.is_station_mode() {
            debug!("Link: {:?} dropped, not in station mode", event);
            return;
        }
        self.link_events.send(event).await;
    }

    pub async fn next_link_event(&self) -> LinkEvent {
        self.link_events.receive().await
    }

    /// Non-blocking receive, for draining.
    pub fn try_next_link_event(&self) -> Option<LinkEvent> {
        self.link_events.try_receive().ok()
    }

    // ── Retry timer ───────────────────────────────────────────

    /// Arm the retry timer. A newer request replaces a pending one.
    pub fn schedule_retry(&self, delay: Duration) {
        self.retry_timer.signal(delay);
    }

    pub async fn wait_retry_request(&self) -> Duration {
        self.retry_timer.wait().await
    }

    // ── Diagnostics mirror ────────────────────────────────────

    /// Publish the reactor's view for the liveness log.
    pub fn publish_link_status(&self, state: ConnectionState, retry_count: u32) {
        self.link_state.store(state as u8, Ordering::Relaxed);
        self.retry_count.store(retry_count, Ordering::Relaxed);
    }

    pub fn link_state(&self) -> ConnectionState {
        ConnectionState::from_index(self.link_state.load(Ordering::Relaxed) as usize)
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::Relaxed)
    }
}
