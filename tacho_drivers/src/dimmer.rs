use hal::{
    clocks::Clocks,
    pac::TIM4,
    timer::{
        Alignment, CaptureCompareDma, CountDir, OutputCompare, TimChannel, Timer, TimerConfig,
        UpdateReqSrc,
    },
};

use super::pinout;

/// Backlight PWM on TIM4 channel 1 (PB6).
pub struct DimmerPwm {
    tim: Timer<TIM4>,
}

impl DimmerPwm {
    pub fn new(tim4: TIM4, clock_cfg: &Clocks, freq: u16) -> Self {
        let mut timer = Timer::new_tim4(
            tim4,
            freq as f32,
            TimerConfig {
                one_pulse_mode: false,
                update_request_source: UpdateReqSrc::Any,
                auto_reload_preload: true,
                alignment: Alignment::Edge,
                capture_compare_dma: CaptureCompareDma::Update,
                direction: CountDir::Up,
            },
            clock_cfg,
        );
        timer.enable_pwm_output(TimChannel::C1, OutputCompare::Pwm1, 0.0);
        pinout::inputs::DIMMER.init();
        timer.enable();

        DimmerPwm { tim: timer }
    }

    /// Sets the duty cycle, 255 = always on.
    pub fn set_duty(&mut self, duty: u8) {
        let period = self.tim.get_max_duty();
        self.tim.set_duty(TimChannel::C1, Self::duty2compare(duty, period));
    }

    fn duty2compare(duty: u8, period: u32) -> u32 {
        // Full scale maps one past the period so 255 never drops low
        (u32::from(duty) * (period + 1)) / 255
    }
}
