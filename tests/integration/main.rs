//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one supervisor flow
//! against mock ports. All tests run on the host (x86_64) with no real
//! hardware required.

mod bootstrap_tests;
mod connection_tests;
mod mock_ports;
mod reset_flow_tests;
mod supervisor_tests;
