//! GPIO pin assignments for the web thing node (ESP32 DevKitC).
//!
//! Single source of truth for pin numbers. The reset button is wired in
//! `main` through the typed `esp-idf-hal` pin, so the constant here must
//! match the peripheral taken there.

// ---------------------------------------------------------------------------
// Reset control
// ---------------------------------------------------------------------------

/// "Forget network" button. Active-low with internal pull-up; the DevKitC
/// BOOT button sits on this pin.
pub const RESET_BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// Things
// ---------------------------------------------------------------------------

/// Push button exposed as a thing.
pub const THING_BUTTON_GPIO: i32 = 18;

/// LED exposed as a blinking-LED thing.
pub const THING_LED_GPIO: i32 = 2;
