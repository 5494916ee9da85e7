// Implements the gauge face logic: RPM to needle position, indicator zone and dial dimmer.
//
// The mapper is a pure function of the RPM value and never clamps; the stepper driver limits the
// target to the mechanical travel on every control cycle.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

pub mod startup_sweep;

use crate::config::{DimmerConfig, MapperConfig, ZoneThresholds};

/// Indicator zone derived from the RPM value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Zone {
    Off,
    Blue,
    Green,
    Yellow,
    Red,
}

impl Zone {
    /// Lit zones in increasing RPM order.
    pub const LIT: [Zone; 4] = [Zone::Blue, Zone::Green, Zone::Yellow, Zone::Red];

    /// LED channels (red, green, blue) lit for the zone.
    pub const fn rgb(self) -> [bool; 3] {
        match self {
            Zone::Off => [false, false, false],
            Zone::Blue => [false, false, true],
            Zone::Green => [false, true, false],
            Zone::Yellow => [true, true, false],
            Zone::Red => [true, false, false],
        }
    }
}

/// Maps RPM to a needle target and a zone.
#[derive(Clone, Copy)]
pub struct PositionMapper {
    rpm_per_step: u32,
    zones: ZoneThresholds,
}

impl PositionMapper {
    pub const fn new(config: MapperConfig) -> Self {
        Self {
            rpm_per_step: config.rpm_per_step,
            zones: config.zones,
        }
    }

    /// Needle target in motor steps.
    #[inline(always)]
    pub fn target_steps(&self, rpm: u32) -> i32 {
        let steps = rpm.checked_div(self.rpm_per_step).unwrap_or(0);
        i32::try_from(steps).unwrap_or(i32::MAX)
    }

    /// Zone of `rpm`; each breakpoint belongs to the zone below it.
    pub fn zone(&self, rpm: u32) -> Zone {
        let thresholds = self.zones.as_array();
        let passed = thresholds.iter().filter(|&&limit| rpm > limit).count();
        match passed {
            0 => Zone::Off,
            1 => Zone::Blue,
            2 => Zone::Green,
            3 => Zone::Yellow,
            _ => Zone::Red,
        }
    }

    /// RPM at which `zone` starts (0 for `Zone::Off`).
    pub fn zone_threshold(&self, zone: Zone) -> u32 {
        match zone {
            Zone::Off => 0,
            Zone::Blue => self.zones.blue,
            Zone::Green => self.zones.green,
            Zone::Yellow => self.zones.yellow,
            Zone::Red => self.zones.red,
        }
    }
}

/// Dimmer duty for the current illumination request.
#[inline(always)]
pub fn dimmer_duty(config: &DimmerConfig, illumination_on: bool) -> u8 {
    if illumination_on {
        config.dimmed_duty
    } else {
        config.full_duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_mapping() {
        let mapper = PositionMapper::new(MapperConfig::default());
        assert_eq!(mapper.target_steps(0), 0);
        assert_eq!(mapper.target_steps(15_000), 1_500);
        assert_eq!(mapper.target_steps(2_809), 280);
        // The mapper itself never clamps
        assert_eq!(mapper.target_steps(u32::MAX), (u32::MAX / 10) as i32);
    }

    #[test]
    fn zones_use_strict_breakpoints() {
        let mapper = PositionMapper::new(MapperConfig::default());
        assert_eq!(mapper.zone(0), Zone::Off);
        assert_eq!(mapper.zone(2_800), Zone::Off);
        assert_eq!(mapper.zone(2_801), Zone::Blue);
        assert_eq!(mapper.zone(3_401), Zone::Green);
        assert_eq!(mapper.zone(6_800), Zone::Green);
        assert_eq!(mapper.zone(6_801), Zone::Yellow);
        assert_eq!(mapper.zone(9_000), Zone::Red);
    }

    #[test]
    fn zone_colors() {
        assert_eq!(Zone::Yellow.rgb(), [true, true, false]);
        assert_eq!(Zone::Off.rgb(), [false; 3]);
    }

    #[test]
    fn dimmer_follows_request() {
        let config = DimmerConfig::default();
        assert_eq!(dimmer_duty(&config, true), 32);
        assert_eq!(dimmer_duty(&config, false), 255);
    }
}
