//! Drives the four coil terminals of the needle stepper from a coil word.

use hal::gpio::Pin;

use super::pinout;

pub struct CoilOutputs {
    pins: [Pin; 4], // Coil word bits 0..=3
}

impl CoilOutputs {
    /// Claims the coil pins and outputs `initial`.
    pub fn new(initial: u8) -> Self {
        let mut coils = CoilOutputs {
            pins: [
                pinout::coils::A1.init(),
                pinout::coils::B1.init(),
                pinout::coils::A2.init(),
                pinout::coils::B2.init(),
            ],
        };
        coils.apply(initial);
        coils
    }

    /// Sets every pin from its bit of `coils`.
    pub fn apply(&mut self, coils: u8) {
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if coils & (1 << bit) != 0 {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
    }
}
