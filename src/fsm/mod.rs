//! Function-pointer state machine for the station link.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌──────────────┬──────────┬─────────┬───────────────────┐   │
//! │  │ State        │ on_enter │ on_exit │ on_event          │   │
//! │  ├──────────────┼──────────┼─────────┼───────────────────┤   │
//! │  │ Idle         │ fn(ctx)  │ -       │ fn(ctx,ev)->Opt<> │   │
//! │  │ Connecting   │ fn(ctx)  │ -       │ fn(ctx,ev)->Opt<> │   │
//! │  │ Connected    │ fn(ctx)  │ -       │ fn(ctx,ev)->Opt<> │   │
//! │  │ IpAcquired   │ fn(ctx)  │ fn(ctx) │ fn(ctx,ev)->Opt<> │   │
//! │  │ Disconnected │ fn(ctx)  │ -       │ fn(ctx,ev)->Opt<> │   │
//! │  │ Failed       │ -        │ -       │ fn(ctx,ev)->Opt<> │   │
//! │  └──────────────┴──────────┴─────────┴───────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each dispatched [`LinkEvent`] goes to `on_event` of the **current**
//! state. If it returns `Some(next)` with `next` different from the
//! current state, the engine runs `on_exit` for the current state, then
//! `on_enter` for the next. Handlers queue [`LinkAction`]s on the
//! [`LinkContext`]; the reactor in `app::link_task` executes them.

pub mod backoff;
pub mod context;
pub mod states;

use core::net::Ipv4Addr;
use core::time::Duration;

use context::LinkContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Station link states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Idle = 0,
    Connecting = 1,
    Connected = 2,
    IpAcquired = 3,
    Disconnected = 4,
    /// Reserved. No transition leads here; link failures are retried forever.
    Failed = 5,
}

impl ConnectionState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert an index back to a state. Out-of-range maps to `Failed`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::IpAcquired,
            4 => Self::Disconnected,
            _ => Self::Failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Notifications from the radio driver and the retry timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Station interface started.
    LinkStart,
    /// Station interface stopped.
    LinkStop,
    /// Associated with the access point.
    LinkConnected,
    /// Association lost or attempt failed.
    LinkDisconnected,
    /// DHCP assigned an address.
    AddressAcquired(Ipv4Addr),
    /// The reconnect delay has passed.
    RetryElapsed,
}

/// Side effects requested by the state handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Ask the radio to (re)associate.
    RequestConnect,
    /// Arm the retry timer.
    ScheduleRetry { attempt: u32, delay: Duration },
    /// Run the service activation gate.
    ActivateServices(Ipv4Addr),
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut LinkContext);

/// Signature for the per-event handler.
/// Returns `Some(next)` to request a transition, or `None` to stay.
pub type StateEventFn = fn(&mut LinkContext, &LinkEvent) -> Option<ConnectionState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single link state.
pub struct StateDescriptor {
    pub id: ConnectionState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The link state machine engine.
pub struct ConnectionFsm {
    /// Fixed-size table indexed by `ConnectionState as usize`.
    table: [StateDescriptor; ConnectionState::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Number of transitions performed (wraps).
    transitions: u32,
}

impl ConnectionFsm {
    /// Construct the engine, starting in `initial`.
    pub fn new(table: [StateDescriptor; ConnectionState::COUNT], initial: ConnectionState) -> Self {
        Self {
            table,
            current: initial as usize,
            transitions: 0,
        }
    }

    /// Run the initial `on_enter`. Call once before the first dispatch.
    pub fn start(&mut self, ctx: &mut LinkContext) {
        info!("Link FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Feed one event to the current state and apply any transition.
    /// Returns the state after the event.
    pub fn dispatch(&mut self, event: &LinkEvent, ctx: &mut LinkContext) -> ConnectionState {
        if matches!(event, LinkEvent::RetryElapsed) {
            ctx.retry_pending = false;
        }
        let next = (self.table[self.current].on_event)(ctx, event);

        if let Some(next_id) = next {
            if next_id as usize != self.current {
                self.transition(next_id, ctx);
            }
        }
        self.current_state()
    }

    /// The current state's identity.
    pub fn current_state(&self) -> ConnectionState {
        self.table[self.current].id
    }

    /// Transitions performed since construction.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: ConnectionState, ctx: &mut LinkContext) {
        let next_idx = next_id as usize;

        info!(
            "Link FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.transitions = self.transitions.wrapping_add(1);

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
