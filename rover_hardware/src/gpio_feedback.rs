//! Buzzer, status LED and auxiliary light on GPIO.

use rppal::gpio::{Gpio, OutputPin};
use rover_traits::Feedback;

use crate::error::{HwError, Result};
use crate::tone::{BuzzerStep, ToneQueue};

pub struct GpioFeedback {
    buzzer: OutputPin,
    status_led: OutputPin,
    light: OutputPin,
    tones: ToneQueue,
}

impl GpioFeedback {
    pub fn new(buzzer: u8, status_led: u8, light: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let out = |pin: u8| -> Result<OutputPin> {
            gpio.get(pin)
                .map(|p| p.into_output_low())
                .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))
        };
        Ok(Self {
            buzzer: out(buzzer)?,
            status_led: out(status_led)?,
            light: out(light)?,
            tones: ToneQueue::new(),
        })
    }

    fn silence(&mut self) {
        if let Err(e) = self.buzzer.clear_pwm() {
            tracing::warn!(error = %e, "buzzer clear failed");
        }
        self.buzzer.set_low();
    }
}

impl Feedback for GpioFeedback {
    /// Queued; the buzzer changes on the next `service`.
    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        self.tones.push(frequency_hz, duration_ms);
    }

    fn toggle_light(&mut self) {
        self.light.toggle();
        tracing::debug!(on = self.light.is_set_high(), "light toggled");
    }

    fn set_status_led(&mut self, on: bool) {
        if on {
            self.status_led.set_high();
        } else {
            self.status_led.set_low();
        }
    }

    fn service(&mut self, now_ms: u64) {
        match self.tones.service(now_ms) {
            Some(BuzzerStep::Start { frequency_hz }) => {
                if let Err(e) = self.buzzer.set_pwm_frequency(f64::from(frequency_hz), 0.5) {
                    tracing::warn!(error = %e, frequency_hz, "buzzer start failed");
                }
            }
            Some(BuzzerStep::Silence) => {
                tracing::trace!("tone finished");
                self.silence();
            }
            None => {}
        }
    }
}

impl Drop for GpioFeedback {
    fn drop(&mut self) {
        self.silence();
    }
}
