// Implements the needle stepper driver run from the self-rescheduling step timer.
//
// Key Features:
// - Gates normal operation behind homing (`DriverStatus::Homing` -> `DriverStatus::Ready`).
// - Runs one velocity ramp cycle per timer interrupt once homed.
// - Produces the coil word to output and the delay until the next interrupt on every tick.
//
// Detailed Operation:
// The driver is the only writer of the step counter, the velocity and the coil outputs. The main
// loop only writes the target through `set_target`. While homing, each tick issues one homing step
// at the fixed homing delay and target writes are dropped; when homing ends the needle rests on 0
// with the target on 0 and the ramp takes over on the next tick.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

pub mod homing;
pub mod phase_pattern;
pub mod velocity_ramp;

use embedded_time::duration::Microseconds;

use homing::Homing;
use phase_pattern::StepPhasePattern;
use velocity_ramp::{VelocityProfile, VelocityRamp};

use crate::config::{HomingConfig, TravelConfig};

/// Operating state of the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverStatus {
    /// Open-loop homing in progress, target ignored
    Homing,
    /// Tracking the target
    Ready,
}

/// Result of one driver tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverTick {
    /// Coil word to output (bits 3210)
    pub coils: u8,
    /// Time until the next tick
    pub next_delay: Microseconds<u32>,
}

pub struct StepperDriver<const V: usize> {
    status: DriverStatus,
    homing: Homing,
    ramp: VelocityRamp<V>,
    pattern: StepPhasePattern,
    coils: u8, // Coil word of the current position
}

impl<const V: usize> StepperDriver<V> {
    /// Creates a driver that starts by homing.
    pub fn new(
        travel: TravelConfig,
        homing: HomingConfig,
        profile: VelocityProfile<V>,
        pattern: StepPhasePattern,
    ) -> Self {
        let start = Homing::start_position(&homing);
        info!(
            "DRIVER: homing, {} steps back then {} forward",
            homing.retract_steps,
            homing.advance_steps
        );
        Self {
            status: DriverStatus::Homing,
            homing: Homing::new(homing),
            ramp: VelocityRamp::new(travel, profile, start),
            pattern,
            coils: pattern.coils(start),
        }
    }

    /// Runs one step-timer interrupt worth of work.
    pub fn tick(&mut self) -> DriverTick {
        if self.status == DriverStatus::Homing {
            if let Some(direction) = self.homing.tick() {
                self.ramp.step(direction);
                self.coils = self.pattern.coils(self.ramp.position());
                return DriverTick {
                    coils: self.coils,
                    next_delay: self.homing.step_delay(),
                };
            }
            debug_assert_eq!(self.ramp.position(), 0);
            self.ramp.park();
            self.status = DriverStatus::Ready;
            info!("DRIVER: homed, position {}", self.ramp.position());
        }

        if self.ramp.tick().is_some() {
            self.coils = self.pattern.coils(self.ramp.position());
        }
        DriverTick {
            coils: self.coils,
            next_delay: self.ramp.next_delay(),
        }
    }

    /// Requests a new needle target. Dropped while homing.
    #[inline(always)]
    pub fn set_target(&mut self, target: i32) {
        if self.status == DriverStatus::Ready {
            self.ramp.set_target(target);
        }
    }

    pub fn status(&self) -> DriverStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, DriverStatus::Ready) // Returns true if Ready
    }

    pub fn position(&self) -> i32 {
        self.ramp.position()
    }

    pub fn target(&self) -> i32 {
        self.ramp.target()
    }

    pub fn velocity(&self) -> i32 {
        self.ramp.velocity()
    }

    /// Coil word currently driven.
    pub fn coils(&self) -> u8 {
        self.coils
    }
}
