#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Rover control core (hardware-agnostic).
//!
//! All hardware interactions go through the `rover_traits` capabilities:
//! `InputHub`/`InputSource` for gamepads, `Actuator` for the drive motors and
//! `Feedback` for tones and lights.
//!
//! ## Architecture
//!
//! - **Transform**: deadzone, trigger-to-speed map and tank steering (`transform`)
//! - **Safety**: connection/arm/e-stop state machine with watchdog (`safety`)
//! - **Orchestration**: one control cycle per `tick(now_ms)` (`orchestrator`)
//! - **Runner**: clock-paced loop with latency stats (`runner`)
//! - **Configuration**: runtime config structs (`config`)

pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod events;
pub mod hw_error;
pub mod mocks;
pub mod orchestrator;
pub mod runner;
pub mod safety;
pub mod status;
pub mod transform;
pub mod util;

pub use builder::{Rover, RoverBuilder, build_rover};
pub use config::{LoopCfg, SafetyCfg, TransformCfg};
pub use error::{BuildError, RoverError};
pub use orchestrator::TickOrchestrator;
pub use safety::{SafetyGate, SafetyState, WatchdogClock};
pub use status::{DriveOutput, StatusLed, TickReport};
pub use transform::{InputTransform, MotorCommand, RawInputSnapshot};
