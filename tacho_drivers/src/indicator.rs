//! RGB zone indicator.

use hal::gpio::Pin;

use super::pinout;

pub struct ZoneIndicator {
    red: Pin,
    grn: Pin,
    blu: Pin,
}

impl ZoneIndicator {
    /// Claims the LED pins with every color off.
    pub fn new() -> Self {
        let mut indicator = ZoneIndicator {
            red: pinout::led::RED.init(),
            grn: pinout::led::GRN.init(),
            blu: pinout::led::BLU.init(),
        };
        indicator.set_rgb([false; 3]);
        indicator
    }

    /// Lights the colors set in `[red, green, blue]`.
    pub fn set_rgb(&mut self, rgb: [bool; 3]) {
        for (pin, on) in [&mut self.red, &mut self.grn, &mut self.blu].into_iter().zip(rgb) {
            // Active low
            if on {
                pin.set_low();
            } else {
                pin.set_high();
            }
        }
    }
}

impl Default for ZoneIndicator {
    fn default() -> Self {
        Self::new()
    }
}
