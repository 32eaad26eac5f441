//! WebThing node connectivity supervisor.
//!
//! Exposes the supervisor logic for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, with host simulation paths alongside.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod things;

pub mod adapters;
pub mod drivers;
