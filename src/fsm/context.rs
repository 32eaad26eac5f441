//! Mutable context threaded through every link state handler.
//!
//! Handlers never perform I/O. They update the retry counter and queue
//! [`LinkAction`]s here; the reactor drains and executes the queue after
//! each dispatch.

use core::net::Ipv4Addr;
use core::time::Duration;

use log::warn;

use super::LinkAction;
use super::backoff::{BackoffPolicy, FixedBackoff};

/// Upper bound on actions queued by a single event.
pub const MAX_PENDING_ACTIONS: usize = 4;

pub struct LinkContext {
    /// Consecutive link drops since the last address acquisition.
    pub retry_counter: u32,
    /// Most recently acquired address.
    pub last_address: Option<Ipv4Addr>,
    /// A `ScheduleRetry` was issued and its `RetryElapsed` has not arrived.
    pub retry_pending: bool,
    actions: heapless::Vec<LinkAction, MAX_PENDING_ACTIONS>,
    backoff: Box<dyn BackoffPolicy + Send>,
}

impl LinkContext {
    pub fn new(backoff: Box<dyn BackoffPolicy + Send>) -> Self {
        Self {
            retry_counter: 0,
            last_address: None,
            retry_pending: false,
            actions: heapless::Vec::new(),
            backoff,
        }
    }

    /// Context with a fixed reconnect delay.
    pub fn with_fixed_backoff(delay: Duration) -> Self {
        Self::new(Box::new(FixedBackoff::new(delay)))
    }

    /// Queue an action for the reactor.
    pub fn push(&mut self, action: LinkAction) {
        if self.actions.push(action).is_err() {
            warn!("Link: action queue full, dropping {:?}", action);
        }
    }

    /// Take every queued action, leaving the queue empty.
    pub fn take_actions(&mut self) -> heapless::Vec<LinkAction, MAX_PENDING_ACTIONS> {
        core::mem::take(&mut self.actions)
    }

    /// Queue a retry for the current counter value.
    pub fn arm_retry(&mut self) {
        let delay = self.retry_delay();
        self.retry_pending = true;
        self.push(LinkAction::ScheduleRetry {
            attempt: self.retry_counter,
            delay,
        });
    }

    /// Delay before the next reconnect, given the current retry count.
    pub fn retry_delay(&self) -> Duration {
        self.backoff.delay(self.retry_counter)
    }
}
