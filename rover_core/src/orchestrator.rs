//! The per-cycle control loop (`TickOrchestrator`).
//!
//! One `tick(now_ms)` pumps the input hub, applies queued connect/disconnect
//! notifications, runs the watchdog, then walks every connected controller in
//! slot order: emergency stop on Y, edge-triggered arm/horn/light buttons, and
//! finally the gated drive command. Nothing here sleeps or reads a clock.

use crossbeam_channel::Receiver;
use eyre::WrapErr;
use rover_traits::{Actuator, ConnectionEvent, Feedback, InputHub};

use crate::config::{SPEED_CEILING, SafetyCfg, TransformCfg};
use crate::error::Result;
use crate::events::{self, connection_channel};
use crate::hw_error::{map_hw_error, map_input_error};
use crate::safety::{SafetyGate, SafetyState};
use crate::status::{DriveOutput, StatusLed, TickReport};
use crate::transform::{InputTransform, RawInputSnapshot};

/// Operator tones as `(frequency_hz, duration_ms)`.
pub mod tone {
    pub const STARTUP: [(u32, u32); 2] = [(800, 100), (1000, 100)];
    pub const CONNECT: (u32, u32) = (1000, 200);
    pub const DISCONNECT: (u32, u32) = (500, 500);
    pub const ARM: (u32, u32) = (1200, 150);
    pub const DISARM: (u32, u32) = (600, 150);
    pub const HORN: (u32, u32) = (800, 100);
    pub const ALARM: (u32, u32) = (2000, 100);
}

/// Previous-cycle level of the edge-triggered buttons for one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonEdges {
    pub a: bool,
    pub b: bool,
    pub x: bool,
}

impl ButtonEdges {
    fn of(s: &RawInputSnapshot) -> Self {
        Self {
            a: s.button_a,
            b: s.button_b,
            x: s.button_x,
        }
    }
}

/// Sign-to-magnitude conversion for the actuator boundary.
#[inline]
pub fn to_drive(speed: i32) -> (u8, bool) {
    let mag = speed.unsigned_abs().min(SPEED_CEILING as u32) as u8;
    (mag, speed >= 0)
}

pub struct TickOrchestrator<H: InputHub, A: Actuator, F: Feedback> {
    pub(crate) hub: H,
    pub(crate) actuator: A,
    pub(crate) feedback: F,
    pub(crate) gate: SafetyGate,
    pub(crate) transform: InputTransform,
    pub(crate) events: Receiver<ConnectionEvent>,
    pub(crate) edges: Vec<ButtonEdges>,
    pub(crate) status_led: StatusLed,
    pub(crate) actuator_faults: u64,
}

impl<H: InputHub, A: Actuator, F: Feedback> core::fmt::Debug for TickOrchestrator<H, A, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickOrchestrator")
            .field("state", &self.gate.state())
            .field("slots", &self.hub.slot_count())
            .field("tunables", self.transform.tunables())
            .finish()
    }
}

impl<H: InputHub, A: Actuator, F: Feedback> TickOrchestrator<H, A, F> {
    /// Wire the collaborators together and register for hub notifications.
    pub fn new(
        mut hub: H,
        actuator: A,
        feedback: F,
        transform: TransformCfg,
        safety: SafetyCfg,
    ) -> Self {
        let (listener, events) = connection_channel();
        hub.register(Box::new(listener));
        let slots = hub.slot_count();
        Self {
            hub,
            actuator,
            feedback,
            gate: SafetyGate::new(safety.watchdog_timeout_ms),
            transform: InputTransform::new(transform),
            events,
            edges: vec![ButtonEdges::default(); slots],
            status_led: StatusLed::new(),
            actuator_faults: 0,
        }
    }

    pub fn state(&self) -> SafetyState {
        self.gate.state()
    }

    pub fn gate(&self) -> &SafetyGate {
        &self.gate
    }

    pub fn transform(&self) -> &InputTransform {
        &self.transform
    }

    /// Tunables may be changed between ticks.
    pub fn transform_mut(&mut self) -> &mut InputTransform {
        &mut self.transform
    }

    pub fn set_watchdog_timeout(&mut self, timeout_ms: u64) {
        self.gate.set_watchdog_timeout(timeout_ms);
    }

    /// Failed drive commands since construction.
    pub fn actuator_faults(&self) -> u64 {
        self.actuator_faults
    }

    pub fn hub(&self) -> &H {
        &self.hub
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    /// Power-on sequence: motors enabled and stopped, gate reset, startup tones.
    pub fn begin(&mut self, now_ms: u64) -> Result<()> {
        self.actuator
            .enable_motors(true)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("enable_motors")?;
        self.actuator
            .stop_all_motors()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("stop_all_motors")?;
        self.gate.reset(now_ms);
        self.edges.fill(ButtonEdges::default());
        self.status_led = StatusLed::new();
        for (freq, dur) in tone::STARTUP {
            self.feedback.play_tone(freq, dur);
        }
        tracing::info!(
            slots = self.hub.slot_count(),
            "control loop ready; waiting for controller"
        );
        Ok(())
    }

    /// Stop and disable the drive stage.
    pub fn shutdown(&mut self) -> Result<()> {
        self.motor_stop();
        self.actuator
            .enable_motors(false)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("disable motors")?;
        tracing::info!("motors disabled");
        Ok(())
    }

    /// Run one control cycle at monotonic time `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Result<TickReport> {
        if let Err(e) = self.hub.poll() {
            tracing::warn!(error = %map_input_error(&*e), "input hub poll failed");
        }
        for event in events::drain(&self.events) {
            self.on_connection_event(event, now_ms);
        }

        self.gate.update(now_ms);

        let faults_before = self.actuator_faults;
        let mut sources = 0usize;
        let mut output = None;
        for slot in 0..self.hub.slot_count() {
            let snapshot = match self.hub.source(slot) {
                Some(src) if src.is_connected() => RawInputSnapshot::capture(src),
                _ => continue,
            };
            sources += 1;
            output = Some(self.process_source(slot, &snapshot));
            self.gate.record_activity(now_ms);
        }

        if sources == 0 && !self.gate.can_operate_motors() {
            self.motor_stop();
            output = Some(DriveOutput::Stopped);
        }

        if let Some(level) = self.status_led.update(self.gate.state(), now_ms) {
            self.feedback.set_status_led(level);
        }
        self.feedback.service(now_ms);

        Ok(TickReport {
            state: self.gate.state(),
            sources,
            output,
            actuator_faults: self.actuator_faults - faults_before,
        })
    }

    /// Best-effort stop; failures are logged, never propagated.
    pub fn motor_stop(&mut self) {
        if let Err(e) = self.actuator.stop_all_motors() {
            tracing::warn!(error = %map_hw_error(&*e), "stop_all_motors failed");
        }
    }

    fn on_connection_event(&mut self, event: ConnectionEvent, now_ms: u64) {
        match event {
            ConnectionEvent::Connected { slot } => {
                tracing::info!(slot, "controller connected");
                self.gate.connect(now_ms);
                let (freq, dur) = tone::CONNECT;
                self.feedback.play_tone(freq, dur);
            }
            ConnectionEvent::Disconnected { slot } => {
                let others = (0..self.hub.slot_count())
                    .filter(|&s| s != slot)
                    .any(|s| self.hub.source(s).is_some_and(|src| src.is_connected()));
                tracing::info!(slot, others_connected = others, "controller disconnected");
                if !others {
                    self.gate.disconnect();
                }
                self.motor_stop();
                let (freq, dur) = tone::DISCONNECT;
                self.feedback.play_tone(freq, dur);
            }
        }
    }

    fn process_source(&mut self, slot: usize, snap: &RawInputSnapshot) -> DriveOutput {
        if slot >= self.edges.len() {
            self.edges.resize(slot + 1, ButtonEdges::default());
        }
        let prev = self.edges[slot];
        // Recorded before the Y check on purpose: releasing Y while A is still
        // held must not count as a fresh A press.
        self.edges[slot] = ButtonEdges::of(snap);

        // Y is level-triggered: every held cycle re-asserts the stop.
        if snap.button_y {
            self.gate.trigger_emergency_stop();
            self.motor_stop();
            let (freq, dur) = tone::ALARM;
            self.feedback.play_tone(freq, dur);
            tracing::trace!(slot, "emergency stop held");
            return DriveOutput::Stopped;
        }

        if snap.button_a && !prev.a {
            self.on_arm_button();
        }
        if snap.button_b && !prev.b {
            let (freq, dur) = tone::HORN;
            self.feedback.play_tone(freq, dur);
        }
        if snap.button_x && !prev.x {
            self.feedback.toggle_light();
        }

        self.drive(snap)
    }

    /// A is a three-way toggle: clear e-stop, else disarm, else arm.
    fn on_arm_button(&mut self) {
        let (freq, dur) = if self.gate.is_emergency_stop() {
            self.gate.clear_emergency_stop();
            tone::DISARM
        } else if self.gate.is_armed() {
            self.gate.disarm();
            tone::DISARM
        } else {
            self.gate.arm();
            tone::ARM
        };
        self.feedback.play_tone(freq, dur);
    }

    /// Drive faults are absorbed: the motors are stopped for this cycle and
    /// the next tick tries again.
    fn drive(&mut self, snap: &RawInputSnapshot) -> DriveOutput {
        if !self.gate.can_operate_motors() {
            self.motor_stop();
            return DriveOutput::Stopped;
        }

        let cmd = self.transform.process(snap);
        if !cmd.valid {
            self.motor_stop();
            return DriveOutput::Stopped;
        }

        let (left_speed, left_fwd) = to_drive(cmd.left);
        let (right_speed, right_fwd) = to_drive(cmd.right);
        if let Err(e) = self
            .actuator
            .set_both_motors(left_speed, left_fwd, right_speed, right_fwd)
        {
            self.actuator_faults = self.actuator_faults.saturating_add(1);
            tracing::warn!(
                error = %map_hw_error(&*e),
                total = self.actuator_faults,
                "set_both_motors failed; stopping for this cycle"
            );
            self.motor_stop();
            return DriveOutput::Stopped;
        }
        tracing::trace!(left = cmd.left, right = cmd.right, "drive command");
        DriveOutput::Driving {
            left: cmd.left,
            right: cmd.right,
        }
    }
}
