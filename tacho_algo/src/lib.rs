//! Control core of a stepper needle tachometer.
//!
//! A pulse train (2 pulses per crank revolution on the reference gauge) is timed by a capture
//! timer, turned into RPM by a trimmed moving average, mapped to a needle position, and tracked by
//! a trapezoidal velocity ramp driving a 6-state needle stepper.
//!
//! | Module | Runs in | Purpose |
//! | ------ | ------- | ------- |
//! | [`pulse_capture`] | capture interrupt / main loop | period capture, RPM estimate |
//! | [`gauge`] | main loop | RPM to target, indicator zone, dimmer, startup sweep |
//! | [`motor_driver`] | step timer interrupt | homing, velocity ramp, coil patterns |
//! | [`config`] | boot | tuning surfaces and their validation |
//!
//! The crate is hardware free: the firmware owns the timers and pins and feeds events in.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod gauge;
pub mod math_integer;
pub mod motor_driver;
pub mod pulse_capture;

use config::{DimmerConfig, TachoConfig};
use gauge::startup_sweep::StartupSweep;
use gauge::{PositionMapper, Zone};
use motor_driver::velocity_ramp::REFERENCE_VELOCITIES;
use motor_driver::StepperDriver;
use pulse_capture::rate_estimator::RateEstimator;
use pulse_capture::CaptureSnapshot;

/// Period history length of the reference gauge.
pub const REFERENCE_HISTORY: usize = 5;

/// Stepper driver with the reference 48-speed profile.
pub type ReferenceDriver = StepperDriver<REFERENCE_VELOCITIES>;

/// Output of one main-loop pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Estimated speed
    pub rpm: u32,
    /// Needle target for the stepper driver (unclamped)
    pub target: i32,
    /// Indicator zone
    pub zone: Zone,
}

/// Main-loop side of the gauge: rate estimation and mapping.
pub struct Tachometer<const N: usize> {
    estimator: RateEstimator<N>,
    mapper: PositionMapper,
    dimmer: DimmerConfig,
}

impl<const N: usize> Tachometer<N> {
    pub fn new(config: &TachoConfig) -> Self {
        Self {
            estimator: RateEstimator::new(config.estimator, config.capture.stale_overflow_limit),
            mapper: PositionMapper::new(config.mapper),
            dimmer: config.dimmer,
        }
    }

    /// One main-loop pass over the latest capture snapshot.
    pub fn tick(&mut self, input: CaptureSnapshot) -> Reading {
        let rpm = self.estimator.tick(input);
        Reading {
            rpm,
            target: self.mapper.target_steps(rpm),
            zone: self.mapper.zone(rpm),
        }
    }

    /// Dimmer duty for the sampled illumination request.
    pub fn dimmer_duty(&self, illumination_on: bool) -> u8 {
        gauge::dimmer_duty(&self.dimmer, illumination_on)
    }

    /// Sweep to show at boot when no pulse arrived.
    pub fn startup_sweep(&self, config: &TachoConfig) -> StartupSweep {
        StartupSweep::new(self.mapper, config.travel, config.sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_follows_period() {
        let mut tacho: Tachometer<REFERENCE_HISTORY> = Tachometer::new(&TachoConfig::default());
        let input = CaptureSnapshot {
            period_us: 4_000,
            overflow_count: 0,
        };
        let mut reading = tacho.tick(input);
        for _ in 0..REFERENCE_HISTORY {
            reading = tacho.tick(input);
        }
        assert_eq!(
            reading,
            Reading {
                rpm: 7_500,
                target: 750,
                zone: Zone::Red
            }
        );
    }

    #[test]
    fn stale_reading_rests() {
        let mut tacho: Tachometer<REFERENCE_HISTORY> = Tachometer::new(&TachoConfig::default());
        let reading = tacho.tick(CaptureSnapshot {
            period_us: 4_000,
            overflow_count: 5,
        });
        assert_eq!(
            reading,
            Reading {
                rpm: 0,
                target: 0,
                zone: Zone::Off
            }
        );
        assert_eq!(tacho.dimmer_duty(false), 255);
    }
}
