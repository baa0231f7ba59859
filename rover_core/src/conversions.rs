//! `From` implementations bridging `rover_config` types to `rover_core` types.

use crate::config::{LoopCfg, SafetyCfg, TransformCfg};

impl From<&rover_config::ControlCfg> for TransformCfg {
    fn from(c: &rover_config::ControlCfg) -> Self {
        Self {
            deadzone: c.deadzone,
            min_speed: c.min_speed,
            max_speed: c.max_speed,
        }
    }
}

impl From<&rover_config::Safety> for SafetyCfg {
    fn from(c: &rover_config::Safety) -> Self {
        Self {
            watchdog_timeout_ms: c.watchdog_timeout_ms,
        }
    }
}

impl From<&rover_config::RunnerCfg> for LoopCfg {
    fn from(c: &rover_config::RunnerCfg) -> Self {
        Self { tick_hz: c.tick_hz }
    }
}
