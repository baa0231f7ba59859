//! Capability traits the control core is written against.
//!
//! The core never touches pins, radios or buzzers directly; it drives an
//! [`InputHub`] for gamepad state, an [`Actuator`] for the two drive motors
//! and a [`Feedback`] device for tones and lights. Hardware-backed and
//! in-memory implementations live in `rover_hardware`.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type used at every fallible trait boundary.
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// One connected (or connectable) gamepad.
///
/// Axis ranges are documented, not enforced: sticks report -512..=512 and the
/// throttle trigger 0..=1023.
pub trait InputSource {
    fn is_connected(&self) -> bool;
    /// Stick X, positive = right.
    fn axis_x(&self) -> i32;
    /// Stick Y, positive = forward.
    fn axis_y(&self) -> i32;
    fn throttle(&self) -> i32;
    fn button_a(&self) -> bool;
    fn button_b(&self) -> bool;
    fn button_x(&self) -> bool;
    fn button_y(&self) -> bool;
}

/// Link-level notification raised by an [`InputHub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected { slot: usize },
    Disconnected { slot: usize },
}

/// Receiver for [`ConnectionEvent`]s, registered with a hub once at construction.
pub trait ConnectionListener: Send {
    fn notify(&self, event: ConnectionEvent);
}

/// The pairing/transport layer: discovers controllers and exposes them by slot.
pub trait InputHub {
    /// Register the listener that receives connect/disconnect notifications.
    /// A hub holds at most one listener; registering again replaces it.
    fn register(&mut self, listener: Box<dyn ConnectionListener>);

    /// Pump the transport. Implementations refresh source state and notify the
    /// registered listener of link changes observed since the last poll.
    fn poll(&mut self) -> Result<(), DynError>;

    /// Number of controller slots this hub exposes.
    fn slot_count(&self) -> usize;

    /// The source in `slot`, if the slot exists.
    fn source(&self, slot: usize) -> Option<&dyn InputSource>;
}

/// Dual-motor drive stage. Speeds are magnitudes; direction is a separate flag.
pub trait Actuator {
    fn set_both_motors(
        &mut self,
        left_speed: u8,
        left_forward: bool,
        right_speed: u8,
        right_forward: bool,
    ) -> Result<(), DynError>;
    fn stop_all_motors(&mut self) -> Result<(), DynError>;
    fn enable_motors(&mut self, enable: bool) -> Result<(), DynError>;
}

/// Fire-and-forget operator feedback (buzzer, status LED, auxiliary light).
pub trait Feedback {
    /// Consecutive requests play one after another, not on top of each other.
    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32);
    /// Flip the auxiliary light.
    fn toggle_light(&mut self);
    fn set_status_led(&mut self, on: bool);
    /// Called once per control cycle so devices can end timed outputs.
    fn service(&mut self, _now_ms: u64) {}
}

impl<T: InputHub + ?Sized> InputHub for Box<T> {
    fn register(&mut self, listener: Box<dyn ConnectionListener>) {
        (**self).register(listener)
    }
    fn poll(&mut self) -> Result<(), DynError> {
        (**self).poll()
    }
    fn slot_count(&self) -> usize {
        (**self).slot_count()
    }
    fn source(&self, slot: usize) -> Option<&dyn InputSource> {
        (**self).source(slot)
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn set_both_motors(
        &mut self,
        left_speed: u8,
        left_forward: bool,
        right_speed: u8,
        right_forward: bool,
    ) -> Result<(), DynError> {
        (**self).set_both_motors(left_speed, left_forward, right_speed, right_forward)
    }
    fn stop_all_motors(&mut self) -> Result<(), DynError> {
        (**self).stop_all_motors()
    }
    fn enable_motors(&mut self, enable: bool) -> Result<(), DynError> {
        (**self).enable_motors(enable)
    }
}

impl<T: Feedback + ?Sized> Feedback for Box<T> {
    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        (**self).play_tone(frequency_hz, duration_ms)
    }
    fn toggle_light(&mut self) {
        (**self).toggle_light()
    }
    fn set_status_led(&mut self, on: bool) {
        (**self).set_status_led(on)
    }
    fn service(&mut self, now_ms: u64) {
        (**self).service(now_ms)
    }
}
