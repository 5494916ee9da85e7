#![no_std]
#![no_main]

use cortex_m_rt::entry;

use hal::{self, clocks::Clocks, pac};

use tacho_drivers::{
    capture_timer::{CaptureEvent, CaptureTimer},
    dimmer::DimmerPwm,
    TIMER_TICK_HZ,
};

use defmt_rtt as _;
// global logger
use panic_probe as _;

const LOOP_FREQ: u16 = 1_000;
const EXPECTED_US: u32 = TIMER_TICK_HZ / LOOP_FREQ as u32;
const TOLERANCE_US: u32 = 20;
const EDGES: usize = 16;

/// Capture bench test: jumper the dimmer output (PB6) to the pulse input (PB4).
/// Every captured value must be one PWM period, i.e. the counter restarts on each edge.
#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();

    let clock_cfg = Clocks::default();
    clock_cfg.setup().unwrap();

    let mut pwm = DimmerPwm::new(dp.TIM4, &clock_cfg, LOOP_FREQ);
    pwm.set_duty(128);
    let mut capture = CaptureTimer::new(dp.TIM3, &clock_cfg);

    let mut periods = [0u32; EDGES];
    let mut seen = 0;
    // First edge measures from timer start, skip it
    let mut skip = true;
    while seen < EDGES {
        capture.service(|event| {
            if let CaptureEvent::Edge(counter) = event {
                if skip {
                    skip = false;
                } else if seen < EDGES {
                    periods[seen] = counter;
                    seen += 1;
                }
            }
        });
    }

    for period in periods {
        defmt::assert!(
            period.abs_diff(EXPECTED_US) <= TOLERANCE_US,
            "captured {} us, expected {} us",
            period,
            EXPECTED_US
        );
    }
    defmt::info!("CAPTURE: loopback ok, periods {}", periods);

    loop {
        cortex_m::asm::wfi();
    }
}

#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
