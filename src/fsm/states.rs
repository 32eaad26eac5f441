//! Link state handler functions and table builder.
//!
//! ```text
//!  IDLE ──[start]──▶ CONNECTING ──[connected]──▶ CONNECTED ──[address]──▶ IP_ACQUIRED
//!                        ▲   │                        │                        │
//!                 [retry]│   └──────[disconnected]────┴────────────────────────┘
//!                        │                 ▼
//!                        └────────── DISCONNECTED ◀─┐
//!                                          └─────────┘ [disconnected: count only]
//!
//!  Any state ──[stop]──▶ IDLE
//! ```

use super::context::LinkContext;
use super::{ConnectionState, LinkAction, LinkEvent, StateDescriptor};
use core::net::Ipv4Addr;
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table. Called once per reactor.
pub fn build_state_table() -> [StateDescriptor; ConnectionState::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: ConnectionState::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_event: idle_event,
        },
        // Index 1: Connecting
        StateDescriptor {
            id: ConnectionState::Connecting,
            name: "Connecting",
            on_enter: Some(connecting_enter),
            on_exit: None,
            on_event: connecting_event,
        },
        // Index 2: Connected
        StateDescriptor {
            id: ConnectionState::Connected,
            name: "Connected",
            on_enter: Some(connected_enter),
            on_exit: None,
            on_event: connected_event,
        },
        // Index 3: IpAcquired
        StateDescriptor {
            id: ConnectionState::IpAcquired,
            name: "IpAcquired",
            on_enter: Some(ip_acquired_enter),
            on_exit: Some(ip_acquired_exit),
            on_event: ip_acquired_event,
        },
        // Index 4: Disconnected
        StateDescriptor {
            id: ConnectionState::Disconnected,
            name: "Disconnected",
            on_enter: Some(disconnected_enter),
            on_exit: None,
            on_event: disconnected_event,
        },
        // Index 5: Failed
        StateDescriptor {
            id: ConnectionState::Failed,
            name: "Failed",
            on_enter: None,
            on_exit: None,
            on_event: failed_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared transitions
// ═══════════════════════════════════════════════════════════════════════════

/// Link dropped: count it and arm the retry timer.
fn link_lost(ctx: &mut LinkContext) -> Option<ConnectionState> {
    ctx.retry_counter = ctx.retry_counter.saturating_add(1);
    ctx.arm_retry();
    Some(ConnectionState::Disconnected)
}

/// Address assigned: clear the counter and ask for service activation.
fn address_acquired(ctx: &mut LinkContext, address: Ipv4Addr) -> Option<ConnectionState> {
    ctx.retry_counter = 0;
    ctx.last_address = Some(address);
    ctx.push(LinkAction::ActivateServices(address));
    Some(ConnectionState::IpAcquired)
}

/// Interface stopped.
fn link_stopped(ctx: &mut LinkContext) -> Option<ConnectionState> {
    ctx.retry_counter = 0;
    Some(ConnectionState::Idle)
}

fn request_connect(ctx: &mut LinkContext) -> Option<ConnectionState> {
    ctx.push(LinkAction::RequestConnect);
    Some(ConnectionState::Connecting)
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(_ctx: &mut LinkContext) {
    info!("IDLE: station interface down");
}

fn idle_event(ctx: &mut LinkContext, event: &LinkEvent) -> Option<ConnectionState> {
    match *event {
        LinkEvent::LinkStart => request_connect(ctx),
        LinkEvent::LinkDisconnected => link_lost(ctx),
        LinkEvent::AddressAcquired(addr) => address_acquired(ctx, addr),
        LinkEvent::LinkStop | LinkEvent::LinkConnected | LinkEvent::RetryElapsed => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut LinkContext) {
    info!("CONNECTING: association requested (retry={})", ctx.retry_counter);
}

fn connecting_event(ctx: &mut LinkContext, event: &LinkEvent) -> Option<ConnectionState> {
    match *event {
        LinkEvent::LinkConnected => Some(ConnectionState::Connected),
        LinkEvent::LinkDisconnected => link_lost(ctx),
        LinkEvent::AddressAcquired(addr) => address_acquired(ctx, addr),
        LinkEvent::LinkStop => link_stopped(ctx),
        LinkEvent::LinkStart | LinkEvent::RetryElapsed => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTED: associated, waiting for DHCP
// ═══════════════════════════════════════════════════════════════════════════

fn connected_enter(_ctx: &mut LinkContext) {
    info!("CONNECTED: associated, waiting for address");
}

fn connected_event(ctx: &mut LinkContext, event: &LinkEvent) -> Option<ConnectionState> {
    match *event {
        LinkEvent::AddressAcquired(addr) => address_acquired(ctx, addr),
        LinkEvent::LinkDisconnected => link_lost(ctx),
        LinkEvent::LinkStop => link_stopped(ctx),
        LinkEvent::LinkStart | LinkEvent::LinkConnected | LinkEvent::RetryElapsed => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IP_ACQUIRED: network usable
// ═══════════════════════════════════════════════════════════════════════════

fn ip_acquired_enter(ctx: &mut LinkContext) {
    match ctx.last_address {
        Some(addr) => info!("IP_ACQUIRED: got ip {}", addr),
        None => info!("IP_ACQUIRED"),
    }
}

fn ip_acquired_exit(_ctx: &mut LinkContext) {
    warn!("IP_ACQUIRED: network lost");
}

fn ip_acquired_event(ctx: &mut LinkContext, event: &LinkEvent) -> Option<ConnectionState> {
    match *event {
        // Renewed or changed lease; the gate ignores repeats.
        LinkEvent::AddressAcquired(addr) => address_acquired(ctx, addr),
        LinkEvent::LinkDisconnected => link_lost(ctx),
        LinkEvent::LinkStop => link_stopped(ctx),
        LinkEvent::LinkStart | LinkEvent::LinkConnected | LinkEvent::RetryElapsed => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISCONNECTED: waiting for the retry timer
// ═══════════════════════════════════════════════════════════════════════════

fn disconnected_enter(ctx: &mut LinkContext) {
    warn!(
        "DISCONNECTED: retry {} in {} ms",
        ctx.retry_counter,
        ctx.retry_delay().as_millis()
    );
}

fn disconnected_event(ctx: &mut LinkContext, event: &LinkEvent) -> Option<ConnectionState> {
    match *event {
        LinkEvent::RetryElapsed => request_connect(ctx),
        LinkEvent::LinkDisconnected => {
            ctx.retry_counter = ctx.retry_counter.saturating_add(1);
            debug!("DISCONNECTED: further drop, retry={}", ctx.retry_counter);
            if !ctx.retry_pending {
                ctx.arm_retry();
            }
            None
        }
        LinkEvent::LinkConnected => Some(ConnectionState::Connected),
        LinkEvent::AddressAcquired(addr) => address_acquired(ctx, addr),
        LinkEvent::LinkStop => link_stopped(ctx),
        LinkEvent::LinkStart => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAILED: terminal, unreachable
// ═══════════════════════════════════════════════════════════════════════════

fn failed_event(_ctx: &mut LinkContext, event: &LinkEvent) -> Option<ConnectionState> {
    debug!("FAILED: ignoring {:?}", event);
    None
}
