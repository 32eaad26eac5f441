//! Thing capabilities exposed by the node.
//!
//! Each capability module has an `init` that returns a [`ThingHandle`]
//! describing it. Handles are registered with the thing server before
//! the network comes up; the server owns their runtime behaviour.

pub mod blinking_led;
pub mod button;

use log::info;
use serde::Serialize;

use crate::app::ports::{ServiceError, ThingServerPort};

/// Opaque description of one thing, as handed to the thing server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThingHandle {
    pub id: heapless::String<32>,
    pub title: &'static str,
    #[serde(rename = "@type")]
    pub kinds: &'static [&'static str],
    pub properties: &'static [&'static str],
    pub gpio: i32,
}

impl ThingHandle {
    /// JSON description for the boot log.
    pub fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.title.into())
    }
}

/// Initialise the root node and register every capability.
/// Returns the number of things registered.
pub fn register_all<T: ThingServerPort>(server: &mut T) -> Result<usize, ServiceError> {
    server.init_root_node();
    let things = [button::init(), blinking_led::init()];
    let count = things.len();
    for thing in things {
        info!("Things: registering {}", thing.describe());
        server.register_thing(thing)?;
    }
    Ok(count)
}

/// `<prefix>-<gpio>` thing identifier.
fn thing_id(prefix: &str, gpio: i32) -> heapless::String<32> {
    let mut id = heapless::String::new();
    // Prefixes are short literals; cannot overflow.
    let _ = core::fmt::Write::write_fmt(&mut id, format_args!("{prefix}-{gpio}"));
    id
}
