#![no_std]
#![no_main]

use cortex_m::peripheral::DWT;
use cortex_m_rt::entry;
use embedded_time::duration::Microseconds;

use hal::{self, clocks::Clocks, pac};

use tacho_drivers::{
    step_timer::{reload_for, StepTimer, MAX_DELAY_US},
    TIMER_TICK_HZ,
};

use defmt_rtt as _;
// global logger
use panic_probe as _;

const DELAYS_US: [u32; 4] = [2_624, 1_500, 704, 10_000];
const REPEATS: u32 = 8;

/// Step timer bench test: every rescheduled period must match the requested delay.
#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().unwrap();
    let dp = pac::Peripherals::take().unwrap();

    let clock_cfg = Clocks::default();
    clock_cfg.setup().unwrap();

    defmt::assert_eq!(reload_for(Microseconds(0u32)), 0);
    defmt::assert_eq!(reload_for(Microseconds(704u32)), 703);
    defmt::assert_eq!(reload_for(Microseconds(MAX_DELAY_US)), u16::MAX);
    defmt::assert_eq!(reload_for(Microseconds(1_000_000u32)), u16::MAX);

    cp.DCB.enable_trace();
    cp.DWT.enable_cycle_counter();
    let cycles_per_us = clock_cfg.sysclk() / TIMER_TICK_HZ;

    let mut timer = StepTimer::new(dp.TIM6, &clock_cfg, Microseconds(DELAYS_US[0]));
    for delay_us in DELAYS_US {
        // Let the period started with the previous delay run out
        while !timer.is_pending() {}
        timer.clear();
        timer.schedule(Microseconds(delay_us));
        let mut last = DWT::cycle_count();

        for _ in 0..REPEATS {
            while !timer.is_pending() {}
            let now = DWT::cycle_count();
            timer.clear();
            timer.schedule(Microseconds(delay_us));

            let elapsed_us = now.wrapping_sub(last) / cycles_per_us;
            last = now;
            defmt::assert!(
                elapsed_us.abs_diff(delay_us) <= 2,
                "period {} us, expected {} us",
                elapsed_us,
                delay_us
            );
        }
        defmt::info!("STEP TIMER: {} us ok", delay_us);
    }

    loop {
        cortex_m::asm::wfi();
    }
}

#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
