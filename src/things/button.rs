//! Push button thing.

use super::{ThingHandle, thing_id};
use crate::pins;

pub fn init() -> ThingHandle {
    ThingHandle {
        id: thing_id("button", pins::THING_BUTTON_GPIO),
        title: "Push button",
        kinds: &["PushButton"],
        properties: &["pushed"],
        gpio: pins::THING_BUTTON_GPIO,
    }
}
