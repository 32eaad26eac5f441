//! Reset button input.
//!
//! Active-low momentary switch with pull-up. The falling edge calls
//! [`on_reset_edge`] from interrupt context; the worker then samples the
//! level through [`ResetInput`].
//!
//! - [`GpioResetInput`] wraps any `embedded-hal` input pin and only
//!   samples; edges come from elsewhere (tests, polling).
//! - `EspResetButton` (ESP-IDF) owns the pin driver, subscribes the ISR
//!   and re-enables the interrupt on [`rearm`](ResetInput::rearm), since
//!   esp-idf-hal disables it after each notification.

use embedded_hal::digital::InputPin;

use crate::app::ports::ResetInput;

#[cfg(target_os = "espidf")]
use crate::app::{reset::on_reset_edge, shared::SupervisorContext};

/// Level sampler over an `embedded-hal` pin.
pub struct GpioResetInput<P> {
    pin: P,
}

impl<P: InputPin> GpioResetInput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> ResetInput for GpioResetInput<P> {
    fn is_asserted(&mut self) -> bool {
        // A read error counts as released.
        self.pin.is_low().unwrap_or(false)
    }

    fn rearm(&mut self) {}
}

#[cfg(target_os = "espidf")]
pub struct EspResetButton {
    driver: esp_idf_svc::hal::gpio::PinDriver<
        'static,
        esp_idf_svc::hal::gpio::AnyIOPin,
        esp_idf_svc::hal::gpio::Input,
    >,
}

#[cfg(target_os = "espidf")]
impl EspResetButton {
    pub fn new(
        pin: esp_idf_svc::hal::gpio::AnyIOPin,
        shared: std::sync::Arc<SupervisorContext>,
    ) -> Result<Self, esp_idf_svc::sys::EspError> {
        use esp_idf_svc::hal::gpio::{InterruptType, PinDriver, Pull};

        let mut driver = PinDriver::input(pin)?;
        driver.set_pull(Pull::Up)?;
        driver.set_interrupt_type(InterruptType::NegEdge)?;
        // SAFETY: the callback only touches atomics.
        unsafe {
            driver.subscribe(move || {
                on_reset_edge(&shared);
            })?;
        }
        driver.enable_interrupt()?;
        if driver.pin() != crate::pins::RESET_BUTTON_GPIO {
            log::warn!(
                "ResetButton: GPIO{} differs from the board map (GPIO{})",
                driver.pin(),
                crate::pins::RESET_BUTTON_GPIO
            );
        }
        log::info!("ResetButton: armed on GPIO{}", driver.pin());
        Ok(Self { driver })
    }
}

#[cfg(target_os = "espidf")]
impl ResetInput for EspResetButton {
    fn is_asserted(&mut self) -> bool {
        self.driver.is_low()
    }

    fn rearm(&mut self) {
        if let Err(e) = self.driver.enable_interrupt() {
            log::error!("ResetButton: re-enabling interrupt failed: {}", e);
        }
    }
}
