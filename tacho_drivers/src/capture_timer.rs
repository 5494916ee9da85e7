// Implements the pulse capture timer (TIM3, channel 1 on PB4).
//
// Key Features:
// - Counts at 1 MHz over the full 16-bit range.
// - Latches the counter on every falling edge and resets it in hardware (slave reset mode), so the
//   captured value is the time since the previous edge modulo the range.
// - Reports counter wraps separately so the caller can extend periods past 65.5 ms.
//
// Detailed Operation:
// The update request source is restricted to real overflows; the reset issued by the slave
// controller therefore never raises the update flag. When an edge and an overflow are both pending
// in one interrupt the overflow happened first: after an edge the counter restarts from 0 and
// cannot wrap again within the interrupt latency.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use hal::{
    clocks::Clocks,
    pac::TIM3,
    timer::{
        Alignment, CaptureCompare, CaptureCompareDma, CountDir, Polarity, TimChannel, Timer,
        TimerConfig, TimerInterrupt, UpdateReqSrc,
    },
};

use super::pinout;

/// Counter range of the capture timer.
pub const CAPTURE_RANGE: u32 = 1 << 16;

/// SMCR.TS: trigger on the filtered timer input 1 (TI1FP1)
const TRIGGER_TI1FP1: u8 = 0b101;
/// SMCR.SMS: slave reset mode, the trigger edge reinitializes the counter
const SLAVE_MODE_RESET: u8 = 0b100;

/// One hardware event, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum CaptureEvent {
    /// Counter wrapped without an edge
    Overflow,
    /// Falling edge; counter value latched before the hardware reset
    Edge(u32),
}

pub struct CaptureTimer {
    tim: Timer<TIM3>,
}

impl CaptureTimer {
    pub fn new(tim3: TIM3, clock_cfg: &Clocks) -> Self {
        let mut timer = Timer::new_tim3(
            tim3,
            1.,
            TimerConfig {
                one_pulse_mode: false,
                update_request_source: UpdateReqSrc::OverUnderflow,
                auto_reload_preload: false,
                alignment: Alignment::Edge,
                capture_compare_dma: CaptureCompareDma::Update,
                direction: CountDir::Up,
            },
            clock_cfg,
        );
        timer.set_prescaler(super::microsecond_prescaler(clock_cfg));
        timer.set_auto_reload(CAPTURE_RANGE - 1);
        timer.set_input_capture(
            TimChannel::C1,
            CaptureCompare::InputTi1,
            Polarity::ActiveLow, // Falling edge
            Polarity::ActiveHigh,
        );
        // The HAL leaves the slave controller alone; the counter reset on edge is set up here.
        // TI1FP1 follows the CC1P polarity above, so the reset happens on the captured edge.
        timer.regs.smcr.modify(|_, w| unsafe {
            w.ts().bits(TRIGGER_TI1FP1);
            w.sms().bits(SLAVE_MODE_RESET)
        });
        pinout::inputs::PULSE.init();

        timer.enable_interrupt(TimerInterrupt::Update);
        timer.enable_interrupt(TimerInterrupt::CaptureCompare1);
        timer.reset_count();
        timer.enable();
        defmt::debug!("CAPTURE: TIM3 running, range {}", CAPTURE_RANGE);

        CaptureTimer { tim: timer }
    }

    /// Drains the pending flags, handing each event to `on_event` in order of occurrence.
    /// Call from the TIM3 interrupt.
    pub fn service(&mut self, mut on_event: impl FnMut(CaptureEvent)) {
        let sr = self.tim.regs.sr.read();
        let overflow = sr.uif().bit_is_set();
        let edge = sr.cc1if().bit_is_set();

        if overflow {
            self.tim.clear_interrupt(TimerInterrupt::Update);
            on_event(CaptureEvent::Overflow);
        }
        if edge {
            // Reading CCR1 also clears CC1IF
            let counter = self.tim.get_duty(TimChannel::C1) as u32;
            self.tim.clear_interrupt(TimerInterrupt::CaptureCompare1);
            on_event(CaptureEvent::Edge(counter));
        }
    }
}
