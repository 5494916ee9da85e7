// Implements the boot-time needle sweep shown when no input pulse is present.
//
// Detailed Operation:
// The needle is sent to the position of every zone breakpoint in increasing order. Once it arrives,
// the zone light is held on for `hold_ms`, then the next breakpoint is approached. After the last
// zone the needle returns to rest and the sweep is done. The sweep never blocks: the main loop polls
// it with the current needle position and a millisecond timestamp and applies the returned frame.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use super::{PositionMapper, Zone};
use crate::config::{SweepConfig, TravelConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SweepStage {
    /// Needle moving to the breakpoint of `Zone::LIT[idx]`
    Approach(usize),
    /// Needle arrived, zone light on since `since_ms`
    Hold { idx: usize, since_ms: u32 },
    /// Needle moving back to rest
    Return,
    Done,
}

/// Output of one sweep poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepFrame {
    /// Needle target to write to the stepper driver
    pub target: i32,
    /// Zone to show on the indicator
    pub zone: Zone,
}

pub struct StartupSweep {
    mapper: PositionMapper,
    travel: TravelConfig,
    hold_ms: u32,
    stage: SweepStage,
}

impl StartupSweep {
    pub fn new(mapper: PositionMapper, travel: TravelConfig, config: SweepConfig) -> Self {
        info!("SWEEP: no input pulse, sweeping zones");
        Self {
            mapper,
            travel,
            hold_ms: config.hold_ms,
            stage: SweepStage::Approach(0),
        }
    }

    /// Advances the sweep. `position` is the current needle position, `now_ms` a free-running
    /// millisecond counter (wrapping is fine).
    pub fn poll(&mut self, position: i32, now_ms: u32) -> SweepFrame {
        match self.stage {
            SweepStage::Approach(idx) if position == self.zone_target(idx) => {
                self.stage = SweepStage::Hold {
                    idx,
                    since_ms: now_ms,
                };
            }
            SweepStage::Hold { idx, since_ms } if now_ms.wrapping_sub(since_ms) >= self.hold_ms => {
                let next = idx + 1;
                self.stage = if next < Zone::LIT.len() {
                    SweepStage::Approach(next)
                } else {
                    SweepStage::Return
                };
            }
            SweepStage::Return if position == self.rest_target() => {
                self.stage = SweepStage::Done;
                info!("SWEEP: done");
            }
            _ => {}
        }

        match self.stage {
            SweepStage::Approach(idx) => SweepFrame {
                target: self.zone_target(idx),
                zone: Zone::Off,
            },
            SweepStage::Hold { idx, .. } => SweepFrame {
                target: self.zone_target(idx),
                zone: Zone::LIT[idx],
            },
            SweepStage::Return | SweepStage::Done => SweepFrame {
                target: self.rest_target(),
                zone: Zone::Off,
            },
        }
    }

    pub fn is_done(&self) -> bool {
        self.stage == SweepStage::Done
    }

    // Targets are clamped here too, otherwise an out-of-travel breakpoint would never be reached
    fn zone_target(&self, idx: usize) -> i32 {
        let rpm = self.mapper.zone_threshold(Zone::LIT[idx]);
        self.travel.clamp(self.mapper.target_steps(rpm))
    }

    fn rest_target(&self) -> i32 {
        self.travel.clamp(0)
    }
}
