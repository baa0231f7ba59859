//! Configuration types for the control core.
//!
//! These are the runtime configuration structs used by `TickOrchestrator`.
//! They are separate from the TOML-deserialized config in `rover_config`.

/// Hard ceiling for a motor speed magnitude (8-bit PWM duty).
pub const SPEED_CEILING: i32 = 255;
/// Full-scale stick deflection in either direction.
pub const AXIS_FULL_SCALE: i32 = 512;
/// Full-scale throttle trigger reading.
pub const TRIGGER_FULL_SCALE: i32 = 1023;

/// Input-to-motor transform tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformCfg {
    /// Stick magnitudes strictly below this are treated as centred.
    pub deadzone: i32,
    /// Base speed at zero throttle once the stick is out of the deadzone.
    pub min_speed: i32,
    /// Base speed at full throttle; also the output clamp.
    pub max_speed: i32,
}

impl Default for TransformCfg {
    fn default() -> Self {
        Self {
            deadzone: 10,
            min_speed: 50,
            max_speed: 255,
        }
    }
}

/// Safety interlock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyCfg {
    /// Inactivity window before a connected controller is considered lost.
    pub watchdog_timeout_ms: u64,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self {
            watchdog_timeout_ms: 2_000,
        }
    }
}

/// Control loop pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopCfg {
    /// Control cycles per second.
    pub tick_hz: u32,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self { tick_hz: 100 }
    }
}
