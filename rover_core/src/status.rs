//! Per-tick status reporting and the status LED blink pattern.

use crate::safety::SafetyState;

/// What the drive stage was told during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutput {
    /// `stop_all_motors` was issued.
    Stopped,
    /// `set_both_motors` was issued with these signed speeds.
    Driving { left: i32, right: i32 },
}

/// Public result of a single control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Gate state at the end of the cycle.
    pub state: SafetyState,
    /// Connected sources processed this cycle.
    pub sources: usize,
    /// Last command handed to the actuator; `None` if nothing was issued.
    pub output: Option<DriveOutput>,
    /// `set_both_motors` calls that failed during this cycle.
    pub actuator_faults: u64,
}

/// Blink half-period for a state; `None` means solid on.
pub fn blink_half_period_ms(state: SafetyState) -> Option<u64> {
    match state {
        SafetyState::EmergencyStop => Some(100),
        SafetyState::Disconnected => Some(1000),
        SafetyState::ConnectedDisarmed => Some(500),
        SafetyState::ConnectedArmed => None,
    }
}

/// Tracks the status LED level so the device is only written on change.
#[derive(Debug, Clone, Default)]
pub struct StatusLed {
    level: bool,
    last_toggle_ms: u64,
    written: bool,
}

impl StatusLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> bool {
        self.level
    }

    /// Advance the pattern; returns the new level when the LED must be written.
    pub fn update(&mut self, state: SafetyState, now_ms: u64) -> Option<bool> {
        match blink_half_period_ms(state) {
            None => {
                let changed = !self.level || !self.written;
                self.level = true;
                self.written = true;
                changed.then_some(true)
            }
            Some(half) => {
                if now_ms.saturating_sub(self.last_toggle_ms) > half {
                    self.level = !self.level;
                    self.last_toggle_ms = now_ms;
                    self.written = true;
                    Some(self.level)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn armed_is_solid_and_written_once() {
        let mut led = StatusLed::new();
        assert_eq!(led.update(SafetyState::ConnectedArmed, 0), Some(true));
        assert_eq!(led.update(SafetyState::ConnectedArmed, 5000), None);
    }

    #[test]
    fn disconnected_blinks_slowly() {
        let mut led = StatusLed::new();
        assert_eq!(led.update(SafetyState::Disconnected, 1000), None);
        assert_eq!(led.update(SafetyState::Disconnected, 1001), Some(true));
        assert_eq!(led.update(SafetyState::Disconnected, 1500), None);
        assert_eq!(led.update(SafetyState::Disconnected, 2002), Some(false));
    }

    #[test]
    fn emergency_stop_blinks_fast() {
        let mut led = StatusLed::new();
        assert_eq!(led.update(SafetyState::EmergencyStop, 101), Some(true));
        assert_eq!(led.update(SafetyState::EmergencyStop, 202), Some(false));
    }
}
