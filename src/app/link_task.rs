//! Link task: drives the connection state machine from queued link events.
//!
//! Runs in a dedicated thread with an `edge-executor` and two futures:
//!
//! 1. **Reactor**: awaits the next [`LinkEvent`], dispatches it through
//!    the FSM, then executes the queued [`LinkAction`]s.
//! 2. **Retry timer**: awaits a retry request, sleeps on an
//!    `async-io-mini` timer, then sends `RetryElapsed` back to the queue,
//!    waiting for room if it is full.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────┐
//!  │  Link Thread                                         │
//!  │  ┌────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                  │  │
//!  │  │  ┌──────────────────┐   ┌──────────────────┐   │  │
//!  │  │  │ Reactor          │   │ Retry timer      │   │  │
//!  │  │  │ wake-on-event    │◀──│ wake-on-request  │   │  │
//!  │  │  └──────────────────┘   └──────────────────┘   │  │
//!  │  └────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────┘
//! ```
//!
//! The reconnect delay never blocks event delivery: the reactor only
//! arms the timer and returns to its queue.

use std::sync::Arc;

use async_io_mini::Timer;
use log::{info, warn};

use super::events::AppEvent;
use super::gate::ServiceActivationGate;
use super::ports::{EventSink, NameAdvertiser, RadioPort, ThingServerPort, TimeSyncPort};
use super::shared::SupervisorContext;
use crate::drivers::task_pin::{self, Core};
use crate::fsm::backoff::BackoffPolicy;
use crate::fsm::context::LinkContext;
use crate::fsm::{ConnectionFsm, ConnectionState, LinkAction, LinkEvent, states};

pub struct LinkReactor<R, T, N, C, E> {
    shared: Arc<SupervisorContext>,
    fsm: ConnectionFsm,
    ctx: LinkContext,
    radio: R,
    gate: ServiceActivationGate<T, N, C>,
    sink: E,
}

impl<R, T, N, C, E> LinkReactor<R, T, N, C, E>
where
    R: RadioPort,
    T: ThingServerPort,
    N: NameAdvertiser,
    C: TimeSyncPort,
    E: EventSink,
{
    pub fn new(
        shared: Arc<SupervisorContext>,
        radio: R,
        gate: ServiceActivationGate<T, N, C>,
        sink: E,
        backoff: Box<dyn BackoffPolicy + Send>,
    ) -> Self {
        let mut fsm = ConnectionFsm::new(states::build_state_table(), ConnectionState::Idle);
        let mut ctx = LinkContext::new(backoff);
        fsm.start(&mut ctx);
        shared.publish_link_status(fsm.current_state(), ctx.retry_counter);
        Self {
            shared,
            fsm,
            ctx,
            radio,
            gate,
            sink,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.fsm.current_state()
    }

    pub fn retry_counter(&self) -> u32 {
        self.ctx.retry_counter
    }

    /// Dispatch one event and execute the resulting actions.
    pub async fn handle(&mut self, event: LinkEvent) {
        let from = self.fsm.current_state();
        let to = self.fsm.dispatch(&event, &mut self.ctx);
        if from != to {
            self.sink.emit(&AppEvent::LinkStateChanged { from, to });
        }
        self.shared.publish_link_status(to, self.ctx.retry_counter);

        for action in self.ctx.take_actions() {
            self.execute(action).await;
        }
    }

    async fn execute(&mut self, action: LinkAction) {
        match action {
            LinkAction::RequestConnect => {
                if let Err(e) = self.radio.connect() {
                    warn!("Link: connect request failed ({})", e);
                }
            }
            LinkAction::ScheduleRetry { attempt, delay } => {
                self.sink.emit(&AppEvent::ReconnectScheduled {
                    attempt,
                    delay_ms: u32::try_from(delay.as_millis()).unwrap_or(u32::MAX),
                });
                self.shared.schedule_retry(delay);
            }
            LinkAction::ActivateServices(address) => {
                if self.gate.activate_once(address).await {
                    self.sink.emit(&AppEvent::ServicesActivated {
                        address,
                        port: self.gate.port(),
                    });
                }
            }
        }
    }

    /// Serve link events forever.
    pub async fn run(mut self) {
        loop {
            let event = self.shared.next_link_event().await;
            self.handle(event).await;
        }
    }
}

/// Retry timer future: one pending delay at a time; a newer request
/// replaces the one not yet picked up.
pub async fn retry_timer(shared: Arc<SupervisorContext>) {
    loop {
        let delay = shared.wait_retry_request().await;
        Timer::after(delay).await;
        shared.send_link_event(LinkEvent::RetryElapsed).await;
    }
}

/// Entry point for the link thread.
fn run_link_loop<R, T, N, C, E>(reactor: LinkReactor<R, T, N, C, E>)
where
    R: RadioPort,
    T: ThingServerPort,
    N: NameAdvertiser,
    C: TimeSyncPort,
    E: EventSink,
{
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    let shared = reactor.shared.clone();

    executor.spawn(retry_timer(shared)).detach();
    executor.spawn(reactor.run()).detach();

    info!("Link task started (reactor + retry timer)");

    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

/// Spawn the link task on the protocol core, next to the WiFi stack.
pub fn spawn<R, T, N, C, E>(
    reactor: LinkReactor<R, T, N, C, E>,
) -> std::io::Result<std::thread::JoinHandle<()>>
where
    R: RadioPort + Send + 'static,
    T: ThingServerPort + Send + 'static,
    N: NameAdvertiser + Send + 'static,
    C: TimeSyncPort + Send + 'static,
    E: EventSink + Send + 'static,
{
    task_pin::spawn_on_core(Core::Pro, 10, 8, "link\0", move || run_link_loop(reactor))
}
