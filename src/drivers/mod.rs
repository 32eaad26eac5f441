//! Low-level platform helpers shared by the adapters and tasks.

pub mod task_pin;
