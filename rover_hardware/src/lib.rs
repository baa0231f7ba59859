pub mod error;
pub mod sim;
pub mod tone;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio_feedback;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod l298n;

#[cfg(feature = "gamepad")]
pub mod gamepad;

pub use sim::{
    Button, MotorState, SimulatedActuator, SimulatedFeedback, SimulatedGamepad, SimulatedHub,
};

pub use tone::{BuzzerStep, ToneQueue};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio_feedback::GpioFeedback;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use l298n::{L298nActuator, MotorPins};

#[cfg(feature = "gamepad")]
pub use gamepad::GilrsHub;
