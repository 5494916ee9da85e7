//! Drives the whole chain (capture -> estimator -> mapper -> stepper driver) on a simulated clock.

use tacho_algo::config::TachoConfig;
use tacho_algo::gauge::startup_sweep::StartupSweep;
use tacho_algo::gauge::Zone;
use tacho_algo::motor_driver::phase_pattern::StepPhasePattern;
use tacho_algo::motor_driver::velocity_ramp::VelocityProfile;
use tacho_algo::pulse_capture::PeriodCapture;
use tacho_algo::{ReferenceDriver, Reading, Tachometer, REFERENCE_HISTORY};

const MAIN_LOOP_US: u64 = 500;
const HOMING_US: u64 = 2_000_000;

/// Event-driven stand-in for the two interrupt contexts and the main loop.
struct Bench {
    config: TachoConfig,
    now_us: u64,

    capture: PeriodCapture,
    tacho: Tachometer<REFERENCE_HISTORY>,
    driver: ReferenceDriver,
    sweep: Option<StartupSweep>,

    pulse_period_us: Option<u64>,
    next_edge: u64,
    last_reset: u64,
    next_wrap: u64,
    next_main: u64,
    next_step: u64,

    reading: Option<Reading>,
    zones_seen: Vec<Zone>,
}

impl Bench {
    fn new() -> Self {
        let config = TachoConfig::default();
        config.validate().unwrap();
        Self {
            capture: PeriodCapture::new(config.capture),
            tacho: Tachometer::new(&config),
            driver: ReferenceDriver::new(
                config.travel,
                config.homing,
                VelocityProfile::reference(),
                StepPhasePattern::X27_168,
            ),
            sweep: None,
            config,
            now_us: 0,
            pulse_period_us: None,
            next_edge: 0,
            last_reset: 0,
            next_wrap: 1 << 16,
            next_main: 0,
            next_step: 0,
            reading: None,
            zones_seen: Vec::new(),
        }
    }

    fn set_pulse_period(&mut self, period_us: Option<u64>) {
        self.pulse_period_us = period_us;
        if let Some(period) = period_us {
            self.next_edge = self.now_us + period;
        }
    }

    fn run_for(&mut self, duration_us: u64) {
        let range = u64::from(self.capture.timer_range());
        let end = self.now_us + duration_us;
        loop {
            let next_edge = self.pulse_period_us.map_or(u64::MAX, |_| self.next_edge);
            let t = next_edge
                .min(self.next_wrap)
                .min(self.next_main)
                .min(self.next_step);
            if t > end {
                self.now_us = end;
                return;
            }
            self.now_us = t;

            if t == self.next_wrap {
                self.capture.on_overflow();
                self.next_wrap += range;
            } else if t == next_edge {
                let counter = (t - self.last_reset) % range;
                self.capture.on_edge(counter as u32);
                self.last_reset = t;
                self.next_wrap = t + range;
                self.next_edge += self.pulse_period_us.unwrap_or(u64::MAX / 2);
            } else if t == self.next_step {
                let tick = self.driver.tick();
                assert_eq!(tick.coils, StepPhasePattern::X27_168.coils(self.driver.position()));
                self.next_step = t + u64::from(tick.next_delay.0);
            } else {
                self.main_loop_pass();
                self.next_main += MAIN_LOOP_US;
            }
        }
    }

    fn main_loop_pass(&mut self) {
        if !self.driver.is_ready() {
            return;
        }
        if let Some(sweep) = self.sweep.as_mut() {
            let frame = sweep.poll(self.driver.position(), (self.now_us / 1_000) as u32);
            self.driver.set_target(frame.target);
            if frame.zone != Zone::Off && self.zones_seen.last() != Some(&frame.zone) {
                self.zones_seen.push(frame.zone);
            }
            if sweep.is_done() {
                self.sweep = None;
            }
            return;
        }
        let reading = self.tacho.tick(self.capture.snapshot());
        self.driver.set_target(reading.target);
        self.reading = Some(reading);
    }

    fn settled_at(&self) -> (i32, i32) {
        (self.driver.position(), self.driver.velocity())
    }
}

#[test]
fn needle_tracks_engine_speed() {
    let mut bench = Bench::new();
    bench.run_for(HOMING_US);
    assert!(bench.driver.is_ready());

    bench.set_pulse_period(Some(8_000)); // 3750 rpm
    bench.run_for(3_000_000);
    let reading = bench.reading.unwrap();
    assert_eq!(reading.rpm, 3_750);
    assert_eq!(reading.zone, Zone::Green);
    assert_eq!(bench.settled_at(), (375, 0));
}

#[test]
fn slow_pulses_span_timer_wraps() {
    let mut bench = Bench::new();
    bench.run_for(HOMING_US);

    bench.set_pulse_period(Some(100_000)); // 300 rpm, more than one wrap per period
    bench.run_for(3_000_000);
    assert_eq!(bench.reading.unwrap().rpm, 300);
    assert_eq!(bench.settled_at(), (30, 0));
}

#[test]
fn over_range_speed_pins_needle_at_full_scale() {
    let mut bench = Bench::new();
    bench.run_for(HOMING_US);

    bench.set_pulse_period(Some(2_000)); // 15000 rpm, beyond the dial
    bench.run_for(3_000_000);
    let reading = bench.reading.unwrap();
    assert_eq!(reading.rpm, 15_000);
    assert_eq!(reading.target, 1_500);
    assert_eq!(bench.driver.target(), 845);
    assert_eq!(bench.settled_at(), (845, 0));
}

#[test]
fn needle_returns_when_pulses_stop() {
    let mut bench = Bench::new();
    bench.run_for(HOMING_US);
    bench.set_pulse_period(Some(5_000)); // 6000 rpm
    bench.run_for(2_000_000);
    assert_eq!(bench.settled_at(), (600, 0));

    bench.set_pulse_period(None);
    bench.run_for(2_000_000);
    let silence = bench.capture.snapshot();
    assert!(silence.overflow_count > bench.config.capture.stale_overflow_limit);
    assert_eq!(bench.reading.unwrap().rpm, 0);
    assert_eq!(bench.settled_at(), (0, 0));
}

#[test]
fn sweeps_zones_when_no_pulse_at_boot() {
    let mut bench = Bench::new();
    bench.run_for(HOMING_US);
    bench.run_for(u64::from(bench.config.sweep.first_pulse_wait_ms) * 1_000);
    assert!(!bench.capture.has_pulse());

    bench.sweep = Some(bench.tacho.startup_sweep(&bench.config));
    bench.run_for(5_000_000);
    assert!(bench.sweep.is_none());
    assert_eq!(bench.zones_seen, Zone::LIT.to_vec());
    assert_eq!(bench.settled_at(), (0, 0));
}
