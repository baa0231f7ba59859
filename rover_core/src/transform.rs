//! Gamepad snapshot to tank-drive motor command.
//!
//! The transform is pure: one [`RawInputSnapshot`] plus the current
//! [`TransformCfg`] always yields the same [`MotorCommand`]. Stick Y is the
//! forward axis and stick X the turn axis (positive = right).
//!
//! Raw axis values are used as delivered; only the final speeds are clamped.
//! A source reporting outside -512..=512 or 0..=1023 therefore computes its
//! ratios from out-of-range values before the clamp masks the result.

use rover_traits::InputSource;

use crate::config::{AXIS_FULL_SCALE, SPEED_CEILING, TRIGGER_FULL_SCALE, TransformCfg};

/// One cycle's worth of raw controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawInputSnapshot {
    pub axis_x: i32,
    pub axis_y: i32,
    pub throttle: i32,
    pub button_a: bool,
    pub button_b: bool,
    pub button_x: bool,
    pub button_y: bool,
}

impl RawInputSnapshot {
    /// Sample every channel of `source` once.
    pub fn capture(source: &dyn InputSource) -> Self {
        Self {
            axis_x: source.axis_x(),
            axis_y: source.axis_y(),
            throttle: source.throttle(),
            button_a: source.button_a(),
            button_b: source.button_b(),
            button_x: source.button_x(),
            button_y: source.button_y(),
        }
    }
}

/// Signed per-side speeds; negative means reverse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotorCommand {
    pub left: i32,
    pub right: i32,
    /// `false` means "no commanded motion"; callers must still stop the motors.
    pub valid: bool,
}

impl MotorCommand {
    pub const IDLE: Self = Self {
        left: 0,
        right: 0,
        valid: false,
    };
}

/// Transform `snapshot` with the given tunables.
///
/// Never panics: out-of-range limits are clamped into `0..=255` for the
/// output bound, so a negative `max_speed` yields zero speeds.
pub fn process(snapshot: &RawInputSnapshot, cfg: &TransformCfg) -> MotorCommand {
    let forward = apply_deadzone(snapshot.axis_y, cfg.deadzone);
    let turn = apply_deadzone(snapshot.axis_x, cfg.deadzone);

    if forward == 0 && turn == 0 {
        return MotorCommand::IDLE;
    }

    // Raw configs may carry any limits; only the output bound has to be sane.
    let max = cfg.max_speed.clamp(0, SPEED_CEILING);
    let base = base_speed(snapshot.throttle, cfg.min_speed, cfg.max_speed);
    let (left, right) = tank_steering(forward, turn, base);

    MotorCommand {
        left: left.clamp(-max, max),
        right: right.clamp(-max, max),
        valid: true,
    }
}

/// Zero `value` when its magnitude is strictly below `deadzone`.
#[inline]
pub fn apply_deadzone(value: i32, deadzone: i32) -> i32 {
    if value.unsigned_abs() < deadzone.max(0).unsigned_abs() {
        0
    } else {
        value
    }
}

/// Linear map of the trigger range onto `[min_speed, max_speed]`.
///
/// Zero throttle still yields `min_speed`: once the stick leaves the deadzone
/// the vehicle always moves with at least that base speed.
#[inline]
pub fn base_speed(trigger: i32, min_speed: i32, max_speed: i32) -> i32 {
    let span = i64::from(max_speed) - i64::from(min_speed);
    let scaled = i64::from(trigger) * span / i64::from(TRIGGER_FULL_SCALE);
    (scaled + i64::from(min_speed)).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Split a base speed between the two tracks.
///
/// With forward intent the inside track is slowed by up to half (turn
/// dampening); without it the tracks counter-rotate for a pivot turn.
fn tank_steering(forward: i32, turn: i32, base: i32) -> (i32, i32) {
    let full = AXIS_FULL_SCALE as f32;
    let forward_ratio = forward.unsigned_abs() as f32 / full;
    let turn_ratio = turn.unsigned_abs() as f32 / full;

    if forward != 0 {
        let forward_speed = (forward_ratio * base as f32) as i32;
        let inside = (forward_speed as f32 * (1.0 - turn_ratio * 0.5)) as i32;
        let (left, right) = match turn.signum() {
            1 => (forward_speed, inside),
            -1 => (inside, forward_speed),
            _ => (forward_speed, forward_speed),
        };
        if forward < 0 {
            (left.saturating_neg(), right.saturating_neg())
        } else {
            (left, right)
        }
    } else {
        let pivot = (turn_ratio * base as f32) as i32;
        let counter = pivot.saturating_neg();
        if turn > 0 { (pivot, counter) } else { (counter, pivot) }
    }
}

/// Stateful wrapper owning the tunables; writes are clamped.
#[derive(Debug, Clone, Default)]
pub struct InputTransform {
    cfg: TransformCfg,
}

impl InputTransform {
    pub fn new(cfg: TransformCfg) -> Self {
        let mut t = Self::default();
        t.set_deadzone(cfg.deadzone);
        t.set_speed_limits(cfg.min_speed, cfg.max_speed);
        t
    }

    pub fn process(&self, snapshot: &RawInputSnapshot) -> MotorCommand {
        process(snapshot, &self.cfg)
    }

    pub fn tunables(&self) -> &TransformCfg {
        &self.cfg
    }

    pub fn deadzone(&self) -> i32 {
        self.cfg.deadzone
    }

    pub fn min_speed(&self) -> i32 {
        self.cfg.min_speed
    }

    pub fn max_speed(&self) -> i32 {
        self.cfg.max_speed
    }

    /// Negative thresholds are treated as 0 (no deadzone).
    pub fn set_deadzone(&mut self, deadzone: i32) {
        self.cfg.deadzone = deadzone.max(0);
    }

    /// Clamp `min_speed` into 0..=255, then `max_speed` into min..=255.
    pub fn set_speed_limits(&mut self, min_speed: i32, max_speed: i32) {
        let min = min_speed.clamp(0, SPEED_CEILING);
        let max = max_speed.clamp(min, SPEED_CEILING);
        self.cfg.min_speed = min;
        self.cfg.max_speed = max;
        tracing::debug!(min_speed = min, max_speed = max, "speed limits set");
    }
}
