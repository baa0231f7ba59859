#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the rover.
//!
//! Every section is optional in TOML; missing sections and keys take the
//! defaults of the stock wiring. `Config::validate` checks ranges that serde
//! cannot express.
use std::path::Path;

use serde::Deserialize;

/// BCM GPIO numbers for the drive stage and feedback devices.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Pins {
    pub left_enable: u8,
    pub left_in1: u8,
    pub left_in2: u8,
    pub right_enable: u8,
    pub right_in1: u8,
    pub right_in2: u8,
    pub status_led: u8,
    pub external_led: u8,
    pub buzzer: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            left_enable: 13,
            left_in1: 5,
            left_in2: 4,
            right_enable: 14,
            right_in1: 27,
            right_in2: 26,
            status_led: 2,
            external_led: 22,
            buzzer: 23,
        }
    }
}

impl Pins {
    fn motor_pins(&self) -> [(&'static str, u8); 6] {
        [
            ("left_enable", self.left_enable),
            ("left_in1", self.left_in1),
            ("left_in2", self.left_in2),
            ("right_enable", self.right_enable),
            ("right_in1", self.right_in1),
            ("right_in2", self.right_in2),
        ]
    }
}

/// Stick and trigger shaping.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ControlCfg {
    /// Stick values with magnitude below this read as zero (axis units, 0..512).
    pub deadzone: i32,
    /// Base speed at zero trigger.
    pub min_speed: i32,
    /// Base speed at full trigger.
    pub max_speed: i32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            deadzone: 10,
            min_speed: 50,
            max_speed: 255,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Safety {
    /// Connected controller silent for longer than this trips back to disconnected.
    pub watchdog_timeout_ms: u64,
}

impl Default for Safety {
    fn default() -> Self {
        Self {
            watchdog_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control loop rate.
    pub tick_hz: u32,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self { tick_hz: 100 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct GamepadCfg {
    pub max_gamepads: usize,
}

impl Default for GamepadCfg {
    fn default() -> Self {
        Self { max_gamepads: 4 }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub control: ControlCfg,
    pub safety: Safety,
    pub runner: RunnerCfg,
    pub gamepad: GamepadCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: impl AsRef<Path>) -> eyre::Result<Config> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config {}: {e}", path.display()))?;
    let cfg = load_toml(&text)
        .map_err(|e| eyre::eyre!("failed to parse config {}: {e}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Control
        if !(0..512).contains(&self.control.deadzone) {
            eyre::bail!("control.deadzone must be in [0, 512)");
        }
        if self.control.min_speed < 0 {
            eyre::bail!("control.min_speed must be >= 0");
        }
        if self.control.max_speed > 255 {
            eyre::bail!("control.max_speed must be <= 255");
        }
        if self.control.min_speed > self.control.max_speed {
            eyre::bail!("control.min_speed must be <= control.max_speed");
        }

        // Safety
        if self.safety.watchdog_timeout_ms == 0 {
            eyre::bail!("safety.watchdog_timeout_ms must be >= 1");
        }
        if self.safety.watchdog_timeout_ms > 60 * 1000 {
            eyre::bail!("safety.watchdog_timeout_ms is unreasonably large (>60s)");
        }

        // Runner
        if self.runner.tick_hz == 0 {
            eyre::bail!("runner.tick_hz must be > 0");
        }
        if self.runner.tick_hz > 1000 {
            eyre::bail!("runner.tick_hz must be <= 1000");
        }

        // Gamepad
        if self.gamepad.max_gamepads == 0 || self.gamepad.max_gamepads > 8 {
            eyre::bail!("gamepad.max_gamepads must be in [1, 8]");
        }

        // Pins
        let motor = self.pins.motor_pins();
        for (i, (name, pin)) in motor.iter().enumerate() {
            if let Some((other, _)) = motor[i + 1..].iter().find(|(_, p)| p == pin) {
                eyre::bail!("pins.{name} and pins.{other} share GPIO {pin}");
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_stock_defaults() {
        let cfg = load_toml("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.control.deadzone, 10);
        assert_eq!(cfg.pins.left_enable, 13);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = load_toml("[control]\nmax_speed = 200\n").unwrap();
        assert_eq!(cfg.control.max_speed, 200);
        assert_eq!(cfg.control.min_speed, 50);
    }

    #[test]
    fn unknown_rotation_rejected() {
        let cfg = load_toml("[logging]\nrotation = \"weekly\"\n").unwrap();
        assert!(cfg.validate().is_err());
    }
}
