//! Maps `Box<dyn Error>` from trait boundaries to typed `RoverError`.
//!
//! The traits in `rover_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `rover_hardware::HwError`
//! downcasting.

use crate::error::RoverError;

/// Map an actuator-boundary error to a typed `RoverError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> RoverError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<rover_hardware::error::HwError>() {
            return RoverError::ActuatorFault(hw.to_string());
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("disabled") {
        RoverError::State(s)
    } else {
        RoverError::Actuator(s)
    }
}

/// Map an input-hub error to a typed `RoverError`.
pub fn map_input_error(e: &(dyn std::error::Error + 'static)) -> RoverError {
    RoverError::Input(e.to_string())
}
