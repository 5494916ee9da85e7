#![no_main]
#![no_std]

use defmt_rtt as _;
use panic_probe as _;

use cortex_m::{asm, peripheral::syst::SystClkSource};
use hal::{self, clocks::Clocks, gpio::Pin, pac};

use tacho_algo::{
    config::TachoConfig,
    gauge::startup_sweep::StartupSweep,
    motor_driver::{phase_pattern::StepPhasePattern, velocity_ramp::VelocityProfile},
    pulse_capture::PeriodCapture,
    ReferenceDriver, Tachometer, REFERENCE_HISTORY,
};

/// Rate of the millisecond clock; the main loop runs once per tick.
const SYSTICK_HZ: u32 = 1_000;
/// Backlight PWM frequency
const DIMMER_FREQ: u16 = 1_000;

#[rtic::app(device = pac, peripherals = true)]
mod app {
    use super::*;

    use tacho_drivers::{
        capture_timer::{CaptureEvent, CaptureTimer},
        coils::CoilOutputs,
        dimmer::DimmerPwm,
        indicator::ZoneIndicator,
        pinout,
        step_timer::StepTimer,
    };

    #[shared]
    struct Shared {
        capture: PeriodCapture,
        driver: ReferenceDriver,
        now_ms: u32,
    }

    #[local]
    struct Local {
        capture_timer: CaptureTimer,
        step_timer: StepTimer,
        coils: CoilOutputs,
        config: TachoConfig,
        indicator: ZoneIndicator,
        dimmer: DimmerPwm,
        illumination: Pin,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        let dp = ctx.device;
        let mut syst = ctx.core.SYST;
        let clock_cfg = Clocks::default();
        if clock_cfg.setup().is_err() {
            defmt::panic!("SYSTEM: clock setup failed");
        }
        defmt::debug!("SYSTEM: Clock frequency is {} MHz", clock_cfg.sysclk() / 1000000);

        let config = TachoConfig::default();
        if let Err(err) = config.validate() {
            defmt::panic!("CONFIG: {}", err);
        }
        defmt::info!("CONFIG: {}", config);

        let driver = ReferenceDriver::new(
            config.travel,
            config.homing,
            VelocityProfile::reference(),
            StepPhasePattern::X27_168,
        );
        let coils = CoilOutputs::new(driver.coils());
        let step_timer = StepTimer::new(
            dp.TIM6,
            &clock_cfg,
            embedded_time::duration::Microseconds(config.homing.step_delay_us),
        );

        let capture = PeriodCapture::new(config.capture);
        let capture_timer = CaptureTimer::new(dp.TIM3, &clock_cfg);

        let indicator = ZoneIndicator::new();
        let dimmer = DimmerPwm::new(dp.TIM4, &clock_cfg, DIMMER_FREQ);
        let illumination = pinout::inputs::ILLUMINATION.init();

        syst.set_clock_source(SystClkSource::Core);
        syst.set_reload(clock_cfg.systick() / SYSTICK_HZ - 1);
        syst.clear_current();
        syst.enable_interrupt();
        syst.enable_counter();

        (
            Shared {
                capture,
                driver,
                now_ms: 0,
            },
            Local {
                capture_timer,
                step_timer,
                coils,
                config,
                indicator,
                dimmer,
                illumination,
            },
        )
    }

    // Context A: pulse edges and counter wraps
    #[task(binds = TIM3, shared = [capture], local = [capture_timer], priority = 3)]
    fn capture_event(mut cx: capture_event::Context) {
        let timer = cx.local.capture_timer;
        cx.shared.capture.lock(|capture| {
            timer.service(|event| match event {
                CaptureEvent::Overflow => capture.on_overflow(),
                CaptureEvent::Edge(counter) => {
                    capture.on_edge(counter);
                }
            })
        });
    }

    // Context B: one driver cycle, then rearm with the delay it asked for
    #[task(binds = TIM6_DACUNDER, shared = [driver], local = [step_timer, coils], priority = 2)]
    fn step_tick(mut cx: step_tick::Context) {
        cx.local.step_timer.clear();
        let tick = cx.shared.driver.lock(|driver| driver.tick());
        cx.local.coils.apply(tick.coils);
        cx.local.step_timer.schedule(tick.next_delay);
    }

    #[task(binds = SysTick, shared = [now_ms], priority = 1)]
    fn systick(mut cx: systick::Context) {
        cx.shared.now_ms.lock(|now_ms| *now_ms = now_ms.wrapping_add(1));
    }

    #[idle(shared = [capture, driver, now_ms], local = [config, indicator, dimmer, illumination])]
    fn idle(mut cx: idle::Context) -> ! {
        let config = *cx.local.config;
        let mut tacho: Tachometer<REFERENCE_HISTORY> = Tachometer::new(&config);

        while !cx.shared.driver.lock(|driver| driver.is_ready()) {
            asm::wfi();
        }

        // Give the engine a moment to produce its first pulse
        let homed_ms = cx.shared.now_ms.lock(|now_ms| *now_ms);
        while cx.shared.now_ms.lock(|now_ms| now_ms.wrapping_sub(homed_ms))
            < config.sweep.first_pulse_wait_ms
        {
            asm::wfi();
        }
        let mut sweep: Option<StartupSweep> = if cx.shared.capture.lock(|c| c.has_pulse()) {
            defmt::info!("MAIN: pulse present, skipping sweep");
            None
        } else {
            Some(tacho.startup_sweep(&config))
        };

        let mut last_ms = homed_ms;
        loop {
            let now_ms = cx.shared.now_ms.lock(|now_ms| *now_ms);
            if now_ms == last_ms {
                asm::wfi();
                continue;
            }
            last_ms = now_ms;

            let zone = if let Some(active) = sweep.as_mut() {
                let position = cx.shared.driver.lock(|driver| driver.position());
                let frame = active.poll(position, now_ms);
                cx.shared.driver.lock(|driver| driver.set_target(frame.target));
                frame.zone
            } else {
                let input = cx.shared.capture.lock(|capture| capture.snapshot());
                let reading = tacho.tick(input);
                cx.shared.driver.lock(|driver| driver.set_target(reading.target));
                reading.zone
            };
            if sweep.as_ref().is_some_and(StartupSweep::is_done) {
                sweep = None;
            }

            cx.local.indicator.set_rgb(zone.rgb());
            let illumination_on = cx.local.illumination.is_high();
            cx.local.dimmer.set_duty(tacho.dimmer_duty(illumination_on));
        }
    }
}

#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
