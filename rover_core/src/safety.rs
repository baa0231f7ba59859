//! Safety interlock: connection, arming and emergency-stop state machine.
//!
//! Exactly one [`SafetyState`] is current. Motors may only run in
//! `ConnectedArmed`. `EmergencyStop` is reachable from every state and stays
//! latched across disconnects and reconnects until explicitly cleared.
//!
//! Time is never read here; callers pass a monotonic millisecond timestamp.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyState {
    Disconnected,
    ConnectedDisarmed,
    ConnectedArmed,
    EmergencyStop,
}

impl SafetyState {
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyState::Disconnected => "disconnected",
            SafetyState::ConnectedDisarmed => "connected_disarmed",
            SafetyState::ConnectedArmed => "connected_armed",
            SafetyState::EmergencyStop => "emergency_stop",
        }
    }
}

impl fmt::Display for SafetyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-activity timestamp plus a fixed inactivity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogClock {
    last_activity_ms: u64,
    timeout_ms: u64,
}

impl WatchdogClock {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            last_activity_ms: 0,
            timeout_ms,
        }
    }

    #[inline]
    pub fn touch(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
    }

    #[inline]
    pub fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_activity_ms)
    }

    /// Expired once strictly more than `timeout_ms` has passed.
    #[inline]
    pub fn expired(&self, now_ms: u64) -> bool {
        self.elapsed(now_ms) > self.timeout_ms
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }
}

#[derive(Debug, Clone)]
pub struct SafetyGate {
    state: SafetyState,
    connected: bool,
    watchdog: WatchdogClock,
}

impl SafetyGate {
    pub fn new(watchdog_timeout_ms: u64) -> Self {
        Self {
            state: SafetyState::Disconnected,
            connected: false,
            watchdog: WatchdogClock::new(watchdog_timeout_ms),
        }
    }

    /// Back to power-on state: disconnected, activity clock anchored at `now_ms`.
    pub fn reset(&mut self, now_ms: u64) {
        self.state = SafetyState::Disconnected;
        self.connected = false;
        self.watchdog.touch(now_ms);
    }

    pub fn state(&self) -> SafetyState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_armed(&self) -> bool {
        self.state == SafetyState::ConnectedArmed
    }

    pub fn is_emergency_stop(&self) -> bool {
        self.state == SafetyState::EmergencyStop
    }

    pub fn can_operate_motors(&self) -> bool {
        self.state == SafetyState::ConnectedArmed
    }

    pub fn watchdog(&self) -> &WatchdogClock {
        &self.watchdog
    }

    pub fn time_since_last_activity(&self, now_ms: u64) -> u64 {
        self.watchdog.elapsed(now_ms)
    }

    /// Takes effect on the next `update`; the last activity mark is kept.
    pub fn set_watchdog_timeout(&mut self, timeout_ms: u64) {
        self.watchdog.timeout_ms = timeout_ms;
    }

    /// Level-triggered watchdog check, run once per cycle.
    pub fn update(&mut self, now_ms: u64) {
        if !self.connected || self.state == SafetyState::EmergencyStop {
            return;
        }
        if self.watchdog.expired(now_ms) {
            tracing::warn!(
                idle_ms = self.watchdog.elapsed(now_ms),
                timeout_ms = self.watchdog.timeout_ms,
                "controller watchdog expired"
            );
            self.connected = false;
            self.transition(SafetyState::Disconnected, "watchdog");
        }
    }

    pub fn connect(&mut self, now_ms: u64) {
        self.connected = true;
        self.watchdog.touch(now_ms);
        if self.state == SafetyState::Disconnected {
            self.transition(SafetyState::ConnectedDisarmed, "connect");
        }
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
        if matches!(
            self.state,
            SafetyState::ConnectedDisarmed | SafetyState::ConnectedArmed
        ) {
            self.transition(SafetyState::Disconnected, "disconnect");
        }
    }

    /// Traffic from a connected source; resets the watchdog, never changes state.
    pub fn record_activity(&mut self, now_ms: u64) {
        self.watchdog.touch(now_ms);
    }

    pub fn arm(&mut self) {
        if self.connected && self.state == SafetyState::ConnectedDisarmed {
            self.transition(SafetyState::ConnectedArmed, "arm");
        }
    }

    pub fn disarm(&mut self) {
        if self.state == SafetyState::ConnectedArmed {
            self.transition(SafetyState::ConnectedDisarmed, "disarm");
        }
    }

    pub fn trigger_emergency_stop(&mut self) {
        if self.state != SafetyState::EmergencyStop {
            self.transition(SafetyState::EmergencyStop, "emergency stop");
        }
    }

    /// Leave `EmergencyStop`, routed by whether a controller is still linked.
    pub fn clear_emergency_stop(&mut self) {
        if self.state != SafetyState::EmergencyStop {
            return;
        }
        let next = if self.connected {
            SafetyState::ConnectedDisarmed
        } else {
            SafetyState::Disconnected
        };
        self.transition(next, "emergency stop cleared");
    }

    fn transition(&mut self, to: SafetyState, cause: &'static str) {
        let from = self.state;
        self.state = to;
        if to == SafetyState::EmergencyStop {
            tracing::warn!(%from, %to, cause, "safety state change");
        } else {
            tracing::info!(%from, %to, cause, "safety state change");
        }
    }
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new(crate::config::SafetyCfg::default().watchdog_timeout_ms)
    }
}
