//! Board support for the needle tachometer on STM32G431.
//!
//! Every type here wraps one peripheral and is owned by a single RTIC task; none of them holds
//! gauge state.

#![no_std]

pub mod capture_timer;
pub mod coils;
pub mod dimmer;
pub mod indicator;
pub mod pinout;
pub mod step_timer;

use hal::clocks::Clocks;

/// Counting rate of the capture and step timers.
pub const TIMER_TICK_HZ: u32 = 1_000_000;

/// Prescaler dividing the APB1 timer clock down to `TIMER_TICK_HZ`.
pub(crate) fn microsecond_prescaler(clock_cfg: &Clocks) -> u16 {
    let psc = (clock_cfg.apb1_timer() / TIMER_TICK_HZ).saturating_sub(1);
    psc.min(u32::from(u16::MAX)) as u16
}
