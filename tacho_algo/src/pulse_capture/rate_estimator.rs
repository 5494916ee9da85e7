// Implements the RateEstimator module, turning captured periods into revolutions per minute.
//
// Key Features:
// - Clamps implausibly short periods to a floor so the reciprocal cannot blow up.
// - Keeps the last N periods in a circular history pre-filled with the "no pulse" sentinel.
// - Averages the history after dropping one minimum and one maximum sample (trimmed mean).
// - Reports 0 RPM whenever the capture says the input went stale.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use crate::config::{EstimatorConfig, SENTINEL_PERIOD_US};
use crate::math_integer::fifo_buffer::BufferFIFO;

use super::CaptureSnapshot;

/// RateEstimator estimates the input speed from the last N periods (N >= 3).
pub struct RateEstimator<const N: usize> {
    config: EstimatorConfig,
    stale_overflow_limit: u32,
    history: BufferFIFO<u32, N>, // Last N clamped periods (µs)
    rpm: u32,                    // Last estimate
    stale: bool,                 // Input absent at the last tick
}

impl<const N: usize> RateEstimator<N> {
    const HISTORY_CHECK: () = assert!(N >= 3, "trimmed mean needs at least 3 samples");

    pub fn new(config: EstimatorConfig, stale_overflow_limit: u32) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::HISTORY_CHECK;
        Self {
            config,
            stale_overflow_limit,
            history: BufferFIFO::filled(SENTINEL_PERIOD_US),
            rpm: 0,
            stale: true,
        }
    }

    /// Pushes the latest period and recomputes the estimate. Called once per main-loop pass.
    pub fn tick(&mut self, input: CaptureSnapshot) -> u32 {
        let period_us = input.period_us.max(self.config.min_period_us);
        self.history.write(period_us);

        let stale = input.overflow_count > self.stale_overflow_limit;
        if stale != self.stale {
            if stale {
                warn!("INPUT: pulse lost after {} wraps", input.overflow_count);
            } else {
                info!("INPUT: pulse present, period {} us", period_us);
            }
            self.stale = stale;
        }

        self.rpm = if stale {
            0
        } else {
            let mean = trimmed_mean(self.history.samples());
            // Mean is never below the (non-zero) floor; checked_div covers an unvalidated config
            (u64::from(self.config.rpm_constant))
                .checked_div(mean)
                .unwrap_or(0) as u32
        };
        self.rpm
    }

}

/// Mean of `samples` without one minimum and one maximum instance.
pub fn trimmed_mean<const N: usize>(samples: &[u32; N]) -> u64 {
    let mut sum: u64 = 0;
    let mut min = u32::MAX;
    let mut max = u32::MIN;
    for &sample in samples.iter() {
        sum += u64::from(sample);
        min = min.min(sample);
        max = max.max(sample);
    }
    (sum - u64::from(min) - u64::from(max)) / (N as u64 - 2)
}
