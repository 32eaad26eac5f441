//! Blinking LED thing: on/off plus a blink frequency.

use super::{ThingHandle, thing_id};
use crate::pins;

pub fn init() -> ThingHandle {
    ThingHandle {
        id: thing_id("led", pins::THING_LED_GPIO),
        title: "Blinking LED",
        kinds: &["OnOffSwitch", "Light"],
        properties: &["on", "frequency", "duty"],
        gpio: pins::THING_LED_GPIO,
    }
}
