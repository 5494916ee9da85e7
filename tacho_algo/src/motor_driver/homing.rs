// Implements the open-loop homing sequence of the needle stepper.
//
// Detailed Operation:
// The needle is driven backward for more steps than the full travel, so it ends resting against the
// motor's internal stop from any starting point, then forward by the zero offset to reach the dial
// zero. The step counter starts at `retract - advance`, which makes the sequence end exactly on 0
// without resetting the counter, so the coil phase stays continuous into normal operation.
//
// Missed steps during homing (e.g. a jammed needle) are not detected; the fixed step counts are
// trusted to exceed the travel.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use embedded_time::duration::Microseconds;

use super::velocity_ramp::Direction;
use crate::config::HomingConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HomingStage {
    /// Steps left toward the stop
    Retract(u32),
    /// Steps left back off the stop
    Advance(u32),
    Done,
}

pub struct Homing {
    advance_steps: u32,
    step_delay: Microseconds<u32>,
    stage: HomingStage,
}

impl Homing {
    pub const fn new(config: HomingConfig) -> Self {
        Self {
            advance_steps: config.advance_steps,
            step_delay: Microseconds(config.step_delay_us),
            stage: HomingStage::Retract(config.retract_steps),
        }
    }

    /// Step counter value homing has to start from to finish on 0. Saturates for step counts that
    /// `TachoConfig::validate` rejects.
    pub fn start_position(config: &HomingConfig) -> i32 {
        let start = i64::from(config.retract_steps) - i64::from(config.advance_steps);
        i32::try_from(start).unwrap_or(if start < 0 { i32::MIN } else { i32::MAX })
    }

    /// Next homing step, `None` once the sequence is over.
    pub fn tick(&mut self) -> Option<Direction> {
        if self.stage == HomingStage::Retract(0) {
            self.stage = HomingStage::Advance(self.advance_steps);
        }
        if self.stage == HomingStage::Advance(0) {
            self.stage = HomingStage::Done;
        }
        match self.stage {
            HomingStage::Retract(left) => {
                self.stage = HomingStage::Retract(left - 1);
                Some(Direction::Backward)
            }
            HomingStage::Advance(left) => {
                self.stage = HomingStage::Advance(left - 1);
                Some(Direction::Forward)
            }
            HomingStage::Done => None,
        }
    }

    /// Fixed delay between homing steps.
    #[inline(always)]
    pub fn step_delay(&self) -> Microseconds<u32> {
        self.step_delay
    }
}
