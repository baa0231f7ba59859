//! Type-state builder for `Rover` and generic `build_rover` constructor.
//!
//! The builder enforces at compile time that an input hub and an actuator are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks. Feedback defaults to [`NoopFeedback`].

use std::marker::PhantomData;

use rover_traits::{Actuator, Feedback, InputHub};

use crate::config::{AXIS_FULL_SCALE, LoopCfg, SafetyCfg, TransformCfg};
use crate::error::{BuildError, Result};
use crate::mocks::NoopFeedback;
use crate::orchestrator::TickOrchestrator;
use crate::safety::{SafetyGate, SafetyState};
use crate::status::TickReport;
use crate::transform::InputTransform;

pub type DynOrchestrator =
    TickOrchestrator<Box<dyn InputHub>, Box<dyn Actuator>, Box<dyn Feedback>>;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Boxed orchestrator for callers that pick backends at runtime.
pub struct Rover {
    pub(crate) inner: DynOrchestrator,
    pub(crate) loop_cfg: LoopCfg,
}

impl core::fmt::Debug for Rover {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rover")
            .field("state", &self.inner.state())
            .field("tick_hz", &self.loop_cfg.tick_hz)
            .finish()
    }
}

impl Rover {
    /// Start building a Rover.
    pub fn builder() -> RoverBuilder<Missing, Missing> {
        RoverBuilder::default()
    }

    pub fn loop_cfg(&self) -> LoopCfg {
        self.loop_cfg
    }

    pub fn state(&self) -> SafetyState {
        self.inner.state()
    }

    pub fn gate(&self) -> &SafetyGate {
        self.inner.gate()
    }

    pub fn transform(&self) -> &InputTransform {
        self.inner.transform()
    }

    pub fn transform_mut(&mut self) -> &mut InputTransform {
        self.inner.transform_mut()
    }

    pub fn set_watchdog_timeout(&mut self, timeout_ms: u64) {
        self.inner.set_watchdog_timeout(timeout_ms);
    }

    pub fn begin(&mut self, now_ms: u64) -> Result<()> {
        self.inner.begin(now_ms)
    }

    pub fn tick(&mut self, now_ms: u64) -> Result<TickReport> {
        self.inner.tick(now_ms)
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown()
    }

    /// Borrow the underlying orchestrator, e.g. to hand it to the runner.
    pub fn orchestrator_mut(&mut self) -> &mut DynOrchestrator {
        &mut self.inner
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Rover`. All fields are validated on `build()`.
pub struct RoverBuilder<H, A> {
    hub: Option<Box<dyn InputHub>>,
    actuator: Option<Box<dyn Actuator>>,
    feedback: Option<Box<dyn Feedback>>,
    transform: Option<TransformCfg>,
    safety: Option<SafetyCfg>,
    loop_cfg: Option<LoopCfg>,
    _h: PhantomData<H>,
    _a: PhantomData<A>,
}

impl Default for RoverBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            hub: None,
            actuator: None,
            feedback: None,
            transform: None,
            safety: None,
            loop_cfg: None,
            _h: PhantomData,
            _a: PhantomData,
        }
    }
}

/// Validate configuration; shared by `RoverBuilder::try_build()` and `build_rover()`.
fn validate(transform: &TransformCfg, safety: &SafetyCfg, loop_cfg: &LoopCfg) -> Result<()> {
    if transform.deadzone < 0 || transform.deadzone >= AXIS_FULL_SCALE {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "deadzone must be in 0..512",
        )));
    }
    if safety.watchdog_timeout_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "watchdog_timeout_ms must be >= 1",
        )));
    }
    if loop_cfg.tick_hz == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick_hz must be > 0",
        )));
    }
    Ok(())
}

impl<H, A> RoverBuilder<H, A> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Rover> {
        let hub = self
            .hub
            .ok_or_else(|| eyre::Report::new(BuildError::MissingHub))?;
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let feedback = self
            .feedback
            .unwrap_or_else(|| Box::new(NoopFeedback));
        let transform = self.transform.unwrap_or_default();
        let safety = self.safety.unwrap_or_default();
        let loop_cfg = self.loop_cfg.unwrap_or_default();

        validate(&transform, &safety, &loop_cfg)?;

        Ok(Rover {
            inner: TickOrchestrator::new(hub, actuator, feedback, transform, safety),
            loop_cfg,
        })
    }

    pub fn with_feedback(mut self, feedback: impl Feedback + 'static) -> Self {
        self.feedback = Some(Box::new(feedback));
        self
    }
    pub fn with_transform(mut self, transform: TransformCfg) -> Self {
        self.transform = Some(transform);
        self
    }
    pub fn with_safety(mut self, safety: SafetyCfg) -> Self {
        self.safety = Some(safety);
        self
    }
    pub fn with_loop(mut self, loop_cfg: LoopCfg) -> Self {
        self.loop_cfg = Some(loop_cfg);
        self
    }
    pub fn with_watchdog_timeout_ms(mut self, ms: u64) -> Self {
        self.safety = Some(SafetyCfg {
            watchdog_timeout_ms: ms,
        });
        self
    }
}

// Setters that advance type-state
impl<A> RoverBuilder<Missing, A> {
    pub fn with_hub(self, hub: impl InputHub + 'static) -> RoverBuilder<Set, A> {
        RoverBuilder {
            hub: Some(Box::new(hub)),
            actuator: self.actuator,
            feedback: self.feedback,
            transform: self.transform,
            safety: self.safety,
            loop_cfg: self.loop_cfg,
            _h: PhantomData,
            _a: PhantomData,
        }
    }
}

impl<H> RoverBuilder<H, Missing> {
    pub fn with_actuator(self, actuator: impl Actuator + 'static) -> RoverBuilder<H, Set> {
        RoverBuilder {
            hub: self.hub,
            actuator: Some(Box::new(actuator)),
            feedback: self.feedback,
            transform: self.transform,
            safety: self.safety,
            loop_cfg: self.loop_cfg,
            _h: PhantomData,
            _a: PhantomData,
        }
    }
}

impl RoverBuilder<Set, Set> {
    /// Validate and build the Rover. Only available when hub and actuator are set.
    pub fn build(self) -> Result<Rover> {
        self.try_build()
    }
}

/// Build a statically-dispatched orchestrator from concrete collaborators.
///
/// Shares validation with the builder.
pub fn build_rover<H, A, F>(
    hub: H,
    actuator: A,
    feedback: F,
    transform: TransformCfg,
    safety: SafetyCfg,
    loop_cfg: LoopCfg,
) -> Result<TickOrchestrator<H, A, F>>
where
    H: InputHub,
    A: Actuator,
    F: Feedback,
{
    validate(&transform, &safety, &loop_cfg)?;
    Ok(TickOrchestrator::new(hub, actuator, feedback, transform, safety))
}
