//! Application core: connectivity supervisor logic, no direct I/O.
//!
//! Bring-up, link supervision, reset control and liveness live here.
//! All interaction with the radio, flash and network services goes
//! through the **port traits** in [`ports`], so every flow is testable
//! on the host with mock adapters.

pub mod bootstrap;
pub mod credentials;
pub mod events;
pub mod gate;
pub mod link_task;
pub mod ports;
pub mod portal;
pub mod reset;
pub mod shared;
pub mod supervisor;
