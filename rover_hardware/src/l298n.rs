//! L298N dual H-bridge on Raspberry Pi GPIO.
//!
//! Each side has an enable pin driven with software PWM and two direction
//! inputs. IN1 high / IN2 low is forward.

use rppal::gpio::{Gpio, OutputPin};
use rover_traits::{Actuator, DynError};

use crate::error::{HwError, Result};

const PWM_FREQUENCY_HZ: f64 = 1000.0;

/// BCM pin numbers for one motor channel.
#[derive(Debug, Clone, Copy)]
pub struct MotorPins {
    pub enable: u8,
    pub in1: u8,
    pub in2: u8,
}

struct Channel {
    enable: OutputPin,
    in1: OutputPin,
    in2: OutputPin,
}

impl Channel {
    fn open(gpio: &Gpio, pins: MotorPins) -> Result<Self> {
        let out = |pin: u8| -> Result<OutputPin> {
            gpio.get(pin)
                .map(|p| p.into_output_low())
                .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))
        };
        Ok(Self {
            enable: out(pins.enable)?,
            in1: out(pins.in1)?,
            in2: out(pins.in2)?,
        })
    }

    fn drive(&mut self, speed: u8, forward: bool) -> Result<()> {
        if speed == 0 {
            return self.coast();
        }
        if forward {
            self.in1.set_high();
            self.in2.set_low();
        } else {
            self.in1.set_low();
            self.in2.set_high();
        }
        let duty = f64::from(speed) / 255.0;
        self.enable
            .set_pwm_frequency(PWM_FREQUENCY_HZ, duty)
            .map_err(|e| HwError::Pwm(e.to_string()))
    }

    fn coast(&mut self) -> Result<()> {
        self.enable
            .clear_pwm()
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        self.enable.set_low();
        self.in1.set_low();
        self.in2.set_low();
        Ok(())
    }
}

pub struct L298nActuator {
    left: Channel,
    right: Channel,
    enabled: bool,
}

impl L298nActuator {
    pub fn new(left: MotorPins, right: MotorPins) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let left = Channel::open(&gpio, left)?;
        let right = Channel::open(&gpio, right)?;
        tracing::info!("L298N drive stage ready");
        Ok(Self {
            left,
            right,
            enabled: false,
        })
    }
}

impl Actuator for L298nActuator {
    fn set_both_motors(
        &mut self,
        left_speed: u8,
        left_forward: bool,
        right_speed: u8,
        right_forward: bool,
    ) -> std::result::Result<(), DynError> {
        if !self.enabled {
            return Ok(());
        }
        self.left.drive(left_speed, left_forward)?;
        self.right.drive(right_speed, right_forward)?;
        Ok(())
    }

    fn stop_all_motors(&mut self) -> std::result::Result<(), DynError> {
        self.left.coast()?;
        self.right.coast()?;
        Ok(())
    }

    fn enable_motors(&mut self, enable: bool) -> std::result::Result<(), DynError> {
        self.enabled = enable;
        if !enable {
            self.stop_all_motors()?;
        }
        tracing::debug!(enable, "motor enable");
        Ok(())
    }
}

impl Drop for L298nActuator {
    fn drop(&mut self) {
        if let Err(e) = self.stop_all_motors() {
            tracing::warn!(error = %e, "failed to stop motors on drop");
        }
    }
}
