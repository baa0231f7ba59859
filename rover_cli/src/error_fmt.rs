//! Human-readable error descriptions and structured JSON error formatting.

use rover_core::error::{BuildError, RoverError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingHub => {
                "What happened: No input hub was provided to the control loop.\nLikely causes: The gamepad backend failed to open or was not passed to the builder.\nHow to fix: Ensure the hub is created successfully and passed via with_hub(...).".to_string()
            }
            BuildError::MissingActuator => {
                "What happened: No motor driver was provided to the control loop.\nLikely causes: The drive stage failed to initialize or was not passed to the builder.\nHow to fix: Ensure the actuator is created successfully and passed via with_actuator(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(re) = err.downcast_ref::<RoverError>() {
        return match re {
            RoverError::Actuator(m) | RoverError::ActuatorFault(m) => format!(
                "What happened: The drive stage rejected a motor command ({m}).\nLikely causes: Motor driver wiring, GPIO permissions or an overheated H-bridge.\nHow to fix: Check the [pins] motor entries and driver power, then restart. Motors were stopped."
            ),
            RoverError::Input(m) => format!(
                "What happened: The gamepad backend failed ({m}).\nLikely causes: Missing input device permissions or an unplugged receiver.\nHow to fix: Check that the controller is paired and the process can read input devices."
            ),
            RoverError::Config(m) => format!(
                "What happened: Configuration is invalid ({m}).\nLikely causes: Malformed TOML or out-of-range values.\nHow to fix: Edit the config file and try again."
            ),
            RoverError::State(m) => format!(
                "What happened: Command refused in the current state ({m}).\nLikely causes: Motors were disabled when a drive command arrived.\nHow to fix: Re-run with --log-level=debug to see the state transitions."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open motor pins") || lower.contains("open feedback pins") {
        return "What happened: Failed to initialize GPIO pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("open gamepad hub") {
        return "What happened: The gamepad backend could not be opened.\nLikely causes: No input subsystem available or missing permissions.\nHow to fix: Check udev permissions for input devices, or build without the gamepad feature to simulate.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable machine-readable name for the error class.
pub fn error_kind(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingHub => "MissingHub",
            BuildError::MissingActuator => "MissingActuator",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    match err.downcast_ref::<RoverError>() {
        Some(RoverError::Actuator(_) | RoverError::ActuatorFault(_)) => "Actuator",
        Some(RoverError::Input(_)) => "Input",
        Some(RoverError::Config(_)) => "Config",
        Some(RoverError::State(_)) => "State",
        None => "Error",
    }
}

/// Stable exit codes: 3 actuator, 4 input, 5 config, 6 state, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 5;
    }
    match err.downcast_ref::<RoverError>() {
        Some(RoverError::Actuator(_) | RoverError::ActuatorFault(_)) => 3,
        Some(RoverError::Input(_)) => 4,
        Some(RoverError::Config(_)) => 5,
        Some(RoverError::State(_)) => 6,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": error_kind(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_actuator_fault_keeps_its_code() {
        let err = eyre::Report::new(RoverError::ActuatorFault("pwm error: x".into()))
            .wrap_err("set_both_motors");
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).starts_with("What happened: The drive stage"));
    }

    #[test]
    fn untyped_errors_fall_back() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Error");
    }
}
