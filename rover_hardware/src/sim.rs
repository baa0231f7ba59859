//! In-memory devices for tests and the simulation build.
//!
//! Every simulated device is a cheap handle over shared state: clone it before
//! handing it to the orchestrator and keep the clone to drive inputs or
//! inspect outputs.

use std::cell::RefCell;
use std::rc::Rc;

use rover_traits::{
    Actuator, ConnectionEvent, ConnectionListener, DynError, Feedback, InputHub, InputSource,
};

use crate::error::HwError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    X,
    Y,
}

#[derive(Debug, Clone, Copy, Default)]
struct PadState {
    connected: bool,
    /// Link state last reported to the listener.
    reported: bool,
    axis_x: i32,
    axis_y: i32,
    throttle: i32,
    a: bool,
    b: bool,
    x: bool,
    y: bool,
}

/// Scriptable gamepad living in one hub slot.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGamepad {
    state: Rc<RefCell<PadState>>,
}

impl SimulatedGamepad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair the pad; the hub reports it on its next poll.
    pub fn connect(&self) {
        self.state.borrow_mut().connected = true;
    }

    /// Unpair the pad; the hub reports it on its next poll.
    pub fn disconnect(&self) {
        self.state.borrow_mut().connected = false;
    }

    /// Lose the link without any notification, as a radio dropout would.
    pub fn drop_silently(&self) {
        let mut s = self.state.borrow_mut();
        s.connected = false;
        s.reported = false;
    }

    pub fn set_stick(&self, x: i32, y: i32) {
        let mut s = self.state.borrow_mut();
        s.axis_x = x;
        s.axis_y = y;
    }

    pub fn set_throttle(&self, throttle: i32) {
        self.state.borrow_mut().throttle = throttle;
    }

    pub fn set_button(&self, button: Button, pressed: bool) {
        let mut s = self.state.borrow_mut();
        match button {
            Button::A => s.a = pressed,
            Button::B => s.b = pressed,
            Button::X => s.x = pressed,
            Button::Y => s.y = pressed,
        }
    }

    pub fn press(&self, button: Button) {
        self.set_button(button, true);
    }

    pub fn release(&self, button: Button) {
        self.set_button(button, false);
    }

    /// Centre the sticks, zero the trigger and release every button.
    pub fn neutral(&self) {
        let mut s = self.state.borrow_mut();
        s.axis_x = 0;
        s.axis_y = 0;
        s.throttle = 0;
        s.a = false;
        s.b = false;
        s.x = false;
        s.y = false;
    }
}

impl InputSource for SimulatedGamepad {
    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }
    fn axis_x(&self) -> i32 {
        self.state.borrow().axis_x
    }
    fn axis_y(&self) -> i32 {
        self.state.borrow().axis_y
    }
    fn throttle(&self) -> i32 {
        self.state.borrow().throttle
    }
    fn button_a(&self) -> bool {
        self.state.borrow().a
    }
    fn button_b(&self) -> bool {
        self.state.borrow().b
    }
    fn button_x(&self) -> bool {
        self.state.borrow().x
    }
    fn button_y(&self) -> bool {
        self.state.borrow().y
    }
}

/// Fixed set of simulated pads; raises link notifications on `poll`.
pub struct SimulatedHub {
    pads: Vec<SimulatedGamepad>,
    listener: Option<Box<dyn ConnectionListener>>,
}

impl SimulatedHub {
    /// A hub with `slots` disconnected pads.
    pub fn new(slots: usize) -> Self {
        Self {
            pads: (0..slots).map(|_| SimulatedGamepad::new()).collect(),
            listener: None,
        }
    }

    /// Handle to the pad in `slot`.
    pub fn pad(&self, slot: usize) -> Option<SimulatedGamepad> {
        self.pads.get(slot).cloned()
    }
}

impl InputHub for SimulatedHub {
    fn register(&mut self, listener: Box<dyn ConnectionListener>) {
        self.listener = Some(listener);
    }

    fn poll(&mut self) -> Result<(), DynError> {
        for (slot, pad) in self.pads.iter().enumerate() {
            let event = {
                let mut s = pad.state.borrow_mut();
                if s.connected == s.reported {
                    continue;
                }
                s.reported = s.connected;
                if s.connected {
                    ConnectionEvent::Connected { slot }
                } else {
                    ConnectionEvent::Disconnected { slot }
                }
            };
            tracing::debug!(?event, "simulated link change");
            if let Some(listener) = &self.listener {
                listener.notify(event);
            }
        }
        Ok(())
    }

    fn slot_count(&self) -> usize {
        self.pads.len()
    }

    fn source(&self, slot: usize) -> Option<&dyn InputSource> {
        self.pads.get(slot).map(|p| p as &dyn InputSource)
    }
}

/// Per-side drive state, as last written to the simulated H-bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorState {
    pub speed: u8,
    pub forward: bool,
    pub enabled: bool,
}

impl MotorState {
    pub const STOPPED: Self = Self {
        speed: 0,
        forward: true,
        enabled: false,
    };
}

#[derive(Debug, Clone)]
struct ActuatorState {
    left: MotorState,
    right: MotorState,
    motors_enabled: bool,
    set_calls: u64,
    stop_calls: u64,
    fail_next_set: Option<String>,
}

/// Drive stage that records what it was told.
#[derive(Debug, Clone)]
pub struct SimulatedActuator {
    state: Rc<RefCell<ActuatorState>>,
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedActuator {
    /// Starts stopped and disabled, like an H-bridge at power-on.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ActuatorState {
                left: MotorState::STOPPED,
                right: MotorState::STOPPED,
                motors_enabled: false,
                set_calls: 0,
                stop_calls: 0,
                fail_next_set: None,
            })),
        }
    }

    pub fn left(&self) -> MotorState {
        self.state.borrow().left
    }

    pub fn right(&self) -> MotorState {
        self.state.borrow().right
    }

    pub fn motors_enabled(&self) -> bool {
        self.state.borrow().motors_enabled
    }

    pub fn set_calls(&self) -> u64 {
        self.state.borrow().set_calls
    }

    pub fn stop_calls(&self) -> u64 {
        self.state.borrow().stop_calls
    }

    /// Make the next `set_both_motors` fail with a PWM error.
    pub fn fail_next_set(&self, msg: impl Into<String>) {
        self.state.borrow_mut().fail_next_set = Some(msg.into());
    }
}

impl Actuator for SimulatedActuator {
    fn set_both_motors(
        &mut self,
        left_speed: u8,
        left_forward: bool,
        right_speed: u8,
        right_forward: bool,
    ) -> Result<(), DynError> {
        let mut s = self.state.borrow_mut();
        s.set_calls += 1;
        if let Some(msg) = s.fail_next_set.take() {
            return Err(Box::new(HwError::Pwm(msg)));
        }
        if !s.motors_enabled {
            tracing::trace!("motors disabled; drive command ignored");
            return Ok(());
        }
        s.left = MotorState {
            speed: left_speed,
            forward: left_forward,
            enabled: left_speed > 0,
        };
        s.right = MotorState {
            speed: right_speed,
            forward: right_forward,
            enabled: right_speed > 0,
        };
        Ok(())
    }

    fn stop_all_motors(&mut self) -> Result<(), DynError> {
        let mut s = self.state.borrow_mut();
        s.stop_calls += 1;
        s.left = MotorState::STOPPED;
        s.right = MotorState::STOPPED;
        Ok(())
    }

    fn enable_motors(&mut self, enable: bool) -> Result<(), DynError> {
        let mut s = self.state.borrow_mut();
        s.motors_enabled = enable;
        if !enable {
            s.left = MotorState::STOPPED;
            s.right = MotorState::STOPPED;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct FeedbackState {
    tones: Vec<(u32, u32)>,
    light: bool,
    status_led: bool,
    serviced_at: Option<u64>,
}

/// Feedback device that logs and records every request.
#[derive(Debug, Clone, Default)]
pub struct SimulatedFeedback {
    state: Rc<RefCell<FeedbackState>>,
}

impl SimulatedFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tone played so far as `(frequency_hz, duration_ms)`.
    pub fn tones(&self) -> Vec<(u32, u32)> {
        self.state.borrow().tones.clone()
    }

    pub fn clear_tones(&self) {
        self.state.borrow_mut().tones.clear();
    }

    pub fn light(&self) -> bool {
        self.state.borrow().light
    }

    pub fn status_led(&self) -> bool {
        self.state.borrow().status_led
    }

    pub fn serviced_at(&self) -> Option<u64> {
        self.state.borrow().serviced_at
    }
}

impl Feedback for SimulatedFeedback {
    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        tracing::debug!(frequency_hz, duration_ms, "tone (simulated)");
        self.state.borrow_mut().tones.push((frequency_hz, duration_ms));
    }

    fn toggle_light(&mut self) {
        let mut s = self.state.borrow_mut();
        s.light = !s.light;
        tracing::debug!(on = s.light, "light (simulated)");
    }

    fn set_status_led(&mut self, on: bool) {
        self.state.borrow_mut().status_led = on;
    }

    fn service(&mut self, now_ms: u64) {
        self.state.borrow_mut().serviced_at = Some(now_ms);
    }
}
