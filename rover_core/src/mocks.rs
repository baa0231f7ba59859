//! Test and helper mocks for rover_core

/// Feedback sink that discards every tone and light change; the default when
/// no feedback device is wired into the builder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFeedback;

impl rover_traits::Feedback for NoopFeedback {
    fn play_tone(&mut self, _frequency_hz: u32, _duration_ms: u32) {}
    fn toggle_light(&mut self) {}
    fn set_status_led(&mut self, _on: bool) {}
}
