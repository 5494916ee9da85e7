// Tuning surfaces of the tachometer, grouped per component.
//
// Every component takes its configuration by value in its constructor; `Default` reproduces the
// reference gauge (X27.168 needle stepper, 2 pulses per crank revolution, 1 µs capture tick).
// `TachoConfig::validate` rejects combinations the control loop cannot run with.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use core::fmt;

/// Period reported before the first edge and used to pre-fill the history ("infinite" period).
pub const SENTINEL_PERIOD_US: u32 = 1_000_000_000;

/// Largest homing step count the signed step counter can hold.
const MAX_HOMING_STEPS: u32 = i32::MAX as u32;

/// Period capture timer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureConfig {
    /// Counts per full wrap of the free-running capture counter (1 count = 1 µs)
    pub timer_range: u32,
    /// Wraps without an edge after which the input is considered absent
    pub stale_overflow_limit: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timer_range: 1 << 16,
            stale_overflow_limit: 4, // ~0.26 s without pulse
        }
    }
}

/// Rate estimator configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EstimatorConfig {
    /// Periods below this floor are raised to it before averaging
    pub min_period_us: u32,
    /// `rpm = rpm_constant / mean_period_us`
    pub rpm_constant: u32,
}

impl EstimatorConfig {
    /// Builds the conversion constant for a sensor emitting `pulses_per_rev` pulses per revolution.
    ///
    /// A zero pulse count yields a zero constant, which `validate` rejects.
    pub const fn for_pulses_per_rev(pulses_per_rev: u32) -> Self {
        let rpm_constant = if pulses_per_rev == 0 {
            0
        } else {
            60_000_000 / pulses_per_rev // µs per minute / pulses per revolution
        };
        Self {
            min_period_us: 1_832,
            rpm_constant,
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::for_pulses_per_rev(2)
    }
}

/// RPM breakpoints of the indicator zones, strictly increasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZoneThresholds {
    pub blue: u32,
    pub green: u32,
    pub yellow: u32,
    pub red: u32,
}

impl ZoneThresholds {
    /// Breakpoints in increasing order.
    pub const fn as_array(&self) -> [u32; 4] {
        [self.blue, self.green, self.yellow, self.red]
    }
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            blue: 2_800,
            green: 3_400,
            yellow: 6_800,
            red: 7_400,
        }
    }
}

/// RPM to needle position mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MapperConfig {
    /// RPM represented by one motor step (1 step = 1/3 deg on the dial)
    pub rpm_per_step: u32,
    pub zones: ZoneThresholds,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            rpm_per_step: 10,
            zones: ZoneThresholds::default(),
        }
    }
}

/// Mechanical travel of the needle, in motor steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TravelConfig {
    /// Full travel between the motor's internal stops
    pub full_scale_steps: i32,
    /// Distance between the internal stop and the dial zero, reserved for homing
    pub zero_offset_steps: i32,
    /// Lowest addressable target
    pub lower_bound: i32,
    /// Tolerated distance to target before steps are issued
    pub dead_band: u32,
}

impl TravelConfig {
    /// Highest addressable target.
    #[inline(always)]
    pub const fn upper_bound(&self) -> i32 {
        self.full_scale_steps - self.zero_offset_steps
    }

    /// Limits `target` to `[lower_bound, upper_bound]`.
    #[inline(always)]
    pub fn clamp(&self, target: i32) -> i32 {
        // max/min instead of `clamp` so an unvalidated inverted range cannot panic
        target.max(self.lower_bound).min(self.upper_bound())
    }
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            full_scale_steps: 945, // 315 deg / (1/3 deg per step)
            zero_offset_steps: 100,
            lower_bound: 0,
            dead_band: 0,
        }
    }
}

/// Open-loop homing against the mechanical stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingConfig {
    /// Steps driven toward the stop, must exceed the full travel
    pub retract_steps: u32,
    /// Steps driven back off the stop to reach the dial zero
    pub advance_steps: u32,
    /// Fixed delay between homing steps
    pub step_delay_us: u32,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            retract_steps: 1_000,
            advance_steps: 100,
            step_delay_us: 1_500,
        }
    }
}

/// Dial illumination duty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DimmerConfig {
    /// Duty written while the illumination request is active
    pub dimmed_duty: u8,
    /// Duty written otherwise
    pub full_duty: u8,
}

impl Default for DimmerConfig {
    fn default() -> Self {
        Self {
            dimmed_duty: 32,
            full_duty: u8::MAX,
        }
    }
}

/// Boot-time needle sweep shown when no pulse is present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepConfig {
    /// How long each zone light stays on once the needle arrives
    pub hold_ms: u32,
    /// Wait after homing before checking for a first pulse
    pub first_pulse_wait_ms: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            hold_ms: 250,
            first_pulse_wait_ms: 100,
        }
    }
}

/// Complete configuration of the tachometer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TachoConfig {
    pub capture: CaptureConfig,
    pub estimator: EstimatorConfig,
    pub mapper: MapperConfig,
    pub travel: TravelConfig,
    pub homing: HomingConfig,
    pub dimmer: DimmerConfig,
    pub sweep: SweepConfig,
}

impl TachoConfig {
    /// Checks every scalar tuning value. The velocity profile is checked by `VelocityProfile::new`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.timer_range == 0 {
            return Err(ConfigError::ZeroTimerRange);
        }
        if self.estimator.min_period_us == 0 {
            return Err(ConfigError::ZeroMinPeriod);
        }
        if self.estimator.rpm_constant == 0 {
            return Err(ConfigError::ZeroRpmConstant);
        }
        if self.mapper.rpm_per_step == 0 {
            return Err(ConfigError::ZeroRpmPerStep);
        }
        let zones = self.mapper.zones.as_array();
        if zones.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::ZoneOrder);
        }
        if self.travel.upper_bound() <= self.travel.lower_bound {
            return Err(ConfigError::EmptyTravel);
        }
        if i64::from(self.homing.retract_steps) <= i64::from(self.travel.full_scale_steps) {
            return Err(ConfigError::ShortHomingRetract);
        }
        if self.homing.retract_steps > MAX_HOMING_STEPS || self.homing.advance_steps > MAX_HOMING_STEPS
        {
            return Err(ConfigError::HomingTooLong);
        }
        if self.homing.step_delay_us == 0 {
            return Err(ConfigError::ZeroHomingDelay);
        }
        Ok(())
    }
}

/// Rejected configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ZeroTimerRange,
    ZeroMinPeriod,
    ZeroRpmConstant,
    ZeroRpmPerStep,
    /// Zone breakpoints are not strictly increasing
    ZoneOrder,
    /// `upper_bound` does not lie above `lower_bound`
    EmptyTravel,
    /// Homing retract does not cover the full travel
    ShortHomingRetract,
    /// Homing step counts do not fit the signed step counter
    HomingTooLong,
    ZeroHomingDelay,
    /// Profile needs at least one moving speed besides standstill
    ProfileTooShort,
    /// Profile entry at `index` is zero
    ZeroProfileDelay { index: usize },
    /// Profile entry at `index` is longer than the one before it
    ProfileNotMonotonic { index: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTimerRange => f.write_str("capture timer range is zero"),
            Self::ZeroMinPeriod => f.write_str("minimum period is zero"),
            Self::ZeroRpmConstant => f.write_str("rpm conversion constant is zero"),
            Self::ZeroRpmPerStep => f.write_str("rpm per step is zero"),
            Self::ZoneOrder => f.write_str("zone thresholds are not strictly increasing"),
            Self::EmptyTravel => f.write_str("upper travel bound is not above the lower bound"),
            Self::ShortHomingRetract => {
                f.write_str("homing retract does not exceed the full scale travel")
            }
            Self::HomingTooLong => f.write_str("homing step counts exceed the step counter range"),
            Self::ZeroHomingDelay => f.write_str("homing step delay is zero"),
            Self::ProfileTooShort => f.write_str("velocity profile needs at least two entries"),
            Self::ZeroProfileDelay { index } => {
                write!(f, "velocity profile entry {} is zero", index)
            }
            Self::ProfileNotMonotonic { index } => {
                write!(f, "velocity profile entry {} is slower than entry {}", index, index - 1)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
