// Implements the self-rescheduling step timer (TIM6).
//
// Detailed Operation:
// The timer counts at 1 MHz and raises an update interrupt when it reaches the auto-reload value.
// The interrupt handler runs one stepper driver cycle and writes the returned delay back as the new
// auto-reload value. Preload is off so the value applies to the period that has just started.
//
// TIM6 is a basic timer: the HAL wrapper has no interrupt helpers, so the update interrupt enable
// and flag are handled on the registers directly.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use embedded_time::duration::Microseconds;
use hal::{clocks::Clocks, pac::TIM6, timer::BasicTimer};

/// Longest delay a 16-bit auto-reload can express (ARR + 1 ticks).
pub const MAX_DELAY_US: u32 = 1 << 16;

pub struct StepTimer {
    tim: BasicTimer<TIM6>,
}

impl StepTimer {
    /// Starts the timer with `first` as the delay to the first interrupt.
    pub fn new(tim6: TIM6, clock_cfg: &Clocks, first: Microseconds<u32>) -> Self {
        let mut timer = BasicTimer::new(tim6, 1., clock_cfg);
        timer.regs.cr1.modify(|_, w| w.arpe().clear_bit());
        timer.set_prescaler(super::microsecond_prescaler(clock_cfg));

        let mut step_timer = StepTimer { tim: timer };
        step_timer.schedule(first);
        step_timer.tim.reset_count();
        step_timer.clear();
        step_timer.tim.regs.dier.modify(|_, w| w.uie().set_bit());
        step_timer.tim.enable();
        step_timer
    }

    /// Acknowledges the update interrupt.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.tim.regs.sr.modify(|_, w| w.uif().clear_bit());
    }

    /// True while an update is waiting to be acknowledged.
    #[inline(always)]
    pub fn is_pending(&self) -> bool {
        self.tim.regs.sr.read().uif().bit_is_set()
    }

    /// Sets the time until the next interrupt, clamped to what the counter can express.
    #[inline(always)]
    pub fn schedule(&mut self, delay: Microseconds<u32>) {
        self.tim.set_auto_reload(reload_for(delay));
    }
}

/// Auto-reload value giving `delay` at 1 MHz.
pub fn reload_for(delay: Microseconds<u32>) -> u16 {
    let ticks = delay.0.clamp(1, MAX_DELAY_US);
    u16::try_from(ticks - 1).unwrap_or(u16::MAX)
}
