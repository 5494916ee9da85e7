// Implements the period capture of the tachometer input.
//
// Key Features:
// - Reconstructs the time between two falling edges from a wrapping 16-bit counter.
// - Counts counter wraps between edges to measure periods longer than one timer range.
// - Flags a stale input once too many wraps pass without an edge.
//
// Detailed Operation:
// The capture timer free-runs at 1 count per µs and is reset by hardware on every edge, so the
// captured counter value is the part of the period not covered by full wraps. `on_overflow` is
// called for every wrap, `on_edge` for every capture. Both are meant to run in the capture
// interrupt; the main loop only ever takes a `snapshot` under a lock.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

pub mod rate_estimator;

use crate::config::{CaptureConfig, SENTINEL_PERIOD_US};

/// Consistent copy of the capture state, taken by the main loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureSnapshot {
    /// Last measured period (µs)
    pub period_us: u32,
    /// Wraps since the last edge
    pub overflow_count: u32,
}

/// PeriodCapture turns capture/overflow events into a period in microseconds.
pub struct PeriodCapture {
    config: CaptureConfig,
    overflow_count: u32, // Wraps since the last edge
    last_period_us: u32, // Last computed period
}

impl PeriodCapture {
    pub const fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            overflow_count: 0,
            last_period_us: SENTINEL_PERIOD_US,
        }
    }

    /// Edge captured with the counter at `counter`. Returns the new period.
    pub fn on_edge(&mut self, counter: u32) -> u32 {
        self.last_period_us = self
            .overflow_count
            .saturating_mul(self.config.timer_range)
            .saturating_add(counter);
        self.overflow_count = 0;
        self.last_period_us
    }

    /// Counter wrapped without an edge.
    #[inline(always)]
    pub fn on_overflow(&mut self) {
        self.overflow_count = self.overflow_count.saturating_add(1);
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            period_us: self.last_period_us,
            overflow_count: self.overflow_count,
        }
    }

    /// True once at least one edge has been measured since boot.
    pub fn has_pulse(&self) -> bool {
        self.last_period_us != SENTINEL_PERIOD_US
    }

    /// Counts per counter wrap.
    pub fn timer_range(&self) -> u32 {
        self.config.timer_range
    }
}
