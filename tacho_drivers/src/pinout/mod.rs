//! Board pin map. Each constant is a complete pin description that `init` turns into a HAL pin.
use hal::gpio::{Pin, PinMode, Port};

pub mod coils;
pub mod inputs;
pub mod led;

/// Represents the definition of a GPIO pin.
pub struct PinDef {
    /// The port to which the pin belongs (e.g., Port::A, Port::B).
    port: Port,
    /// The pin number within the port.
    pin: u8,
    /// The mode of the pin (e.g., Output, Input, Alternate function).
    mode: PinMode,
}

impl PinDef {
    pub const fn new(port: Port, pin: u8, mode: PinMode) -> PinDef {
        PinDef { port, pin, mode }
    }

    /// Configures the pin and returns the HAL handle.
    /// # Example
    /// ```ignore
    /// let mut red = pinout::led::RED.init();
    /// red.set_high();
    /// ```
    pub fn init(&self) -> Pin {
        Pin::new(self.port, self.pin, self.mode)
    }
}
