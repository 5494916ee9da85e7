use super::PinDef;
use super::{PinMode, Port};

/// Engine pulse input, TIM3_CH1
pub const PULSE: PinDef = PinDef::new(Port::B, 4, PinMode::Alt(2));

/// Illumination request (high = lights on)
pub const ILLUMINATION: PinDef = PinDef::new(Port::B, 5, PinMode::Input);

/// Backlight dimmer output, TIM4_CH1
pub const DIMMER: PinDef = PinDef::new(Port::B, 6, PinMode::Alt(2));
