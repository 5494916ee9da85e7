//! Needle stepper coil pins. Bit order of the coil word: 0 = A1, 1 = B1, 2 = A2, 3 = B2.
use super::PinDef;
use super::{PinMode, Port};

/// Coil A, first terminal (coil word bit 0)
pub const A1: PinDef = PinDef::new(Port::A, 1, PinMode::Output);

/// Coil B, first terminal (coil word bit 1)
pub const B1: PinDef = PinDef::new(Port::B, 10, PinMode::Output);

/// Coil A, second terminal (coil word bit 2)
pub const A2: PinDef = PinDef::new(Port::A, 0, PinMode::Output);

/// Coil B, second terminal (coil word bit 3)
pub const B2: PinDef = PinDef::new(Port::B, 11, PinMode::Output);
