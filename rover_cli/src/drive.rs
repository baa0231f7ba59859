//! Device assembly and the `drive`, `self-check` and `health` commands.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use rover_config::Config;
use rover_core::runner::{LoopStats, RunParams};
use rover_core::{LoopCfg, Rover, SafetyCfg, TransformCfg};
use rover_traits::clock::MonotonicClock;
use rover_traits::{Actuator, Feedback, InputHub};

use crate::cli::RtOpts;
use crate::rt::setup_rt_once;

/// Set in tests to arm controller 0 and push its stick forward (simulation only).
const ENV_SIM_DRIVE: &str = "ROVER_TEST_SIM_DRIVE";
/// Set in tests to make the first simulated motor write fail.
const ENV_SIM_FAULT: &str = "ROVER_TEST_SIM_FAULT";

type SimPad = rover_hardware::SimulatedGamepad;

/// An assembled rover plus handles kept for simulation scripting.
pub struct Stack {
    pub rover: Rover,
    pub backend: &'static str,
    sim_pad: Option<SimPad>,
}

impl Stack {
    /// Pair simulated controller 0; no-op with a real hub.
    pub fn sim_connect(&self) {
        if let Some(pad) = &self.sim_pad {
            pad.connect();
            if std::env::var_os(ENV_SIM_DRIVE).is_some() {
                pad.press(rover_hardware::Button::A);
                pad.set_stick(0, 512);
            }
        }
    }
}

#[cfg(feature = "gamepad")]
fn open_hub(cfg: &Config) -> eyre::Result<(Box<dyn InputHub>, Option<SimPad>)> {
    let hub =
        rover_hardware::GilrsHub::new(cfg.gamepad.max_gamepads).wrap_err("open gamepad hub")?;
    Ok((Box::new(hub), None))
}

#[cfg(not(feature = "gamepad"))]
fn open_hub(cfg: &Config) -> eyre::Result<(Box<dyn InputHub>, Option<SimPad>)> {
    let hub = rover_hardware::SimulatedHub::new(cfg.gamepad.max_gamepads);
    let pad = hub.pad(0);
    Ok((Box::new(hub), pad))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_outputs(cfg: &Config) -> eyre::Result<(Box<dyn Actuator>, Box<dyn Feedback>)> {
    use rover_hardware::{GpioFeedback, L298nActuator, MotorPins};
    let p = &cfg.pins;
    let actuator = L298nActuator::new(
        MotorPins {
            enable: p.left_enable,
            in1: p.left_in1,
            in2: p.left_in2,
        },
        MotorPins {
            enable: p.right_enable,
            in1: p.right_in1,
            in2: p.right_in2,
        },
    )
    .wrap_err("open motor pins")?;
    let feedback = GpioFeedback::new(p.buzzer, p.status_led, p.external_led)
        .wrap_err("open feedback pins")?;
    Ok((Box::new(actuator), Box::new(feedback)))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_outputs(_cfg: &Config) -> eyre::Result<(Box<dyn Actuator>, Box<dyn Feedback>)> {
    let actuator = rover_hardware::SimulatedActuator::new();
    if std::env::var_os(ENV_SIM_FAULT).is_some() {
        actuator.fail_next_set("injected fault");
    }
    Ok((
        Box::new(actuator),
        Box::new(rover_hardware::SimulatedFeedback::new()),
    ))
}

fn backend_name() -> &'static str {
    match (
        cfg!(feature = "gamepad"),
        cfg!(all(feature = "hardware", target_os = "linux")),
    ) {
        (true, true) => "gamepad+gpio",
        (true, false) => "gamepad+sim",
        (false, true) => "sim+gpio",
        (false, false) => "sim",
    }
}

/// Build the rover from config using the compiled-in backends.
pub fn assemble(cfg: &Config, tick_hz_override: Option<u32>) -> eyre::Result<Stack> {
    let (hub, sim_pad) = open_hub(cfg)?;
    let (actuator, feedback) = open_outputs(cfg)?;

    let mut loop_cfg: LoopCfg = (&cfg.runner).into();
    if let Some(hz) = tick_hz_override {
        loop_cfg.tick_hz = hz;
    }
    let rover = Rover::builder()
        .with_hub(hub)
        .with_actuator(actuator)
        .with_feedback(feedback)
        .with_transform(TransformCfg::from(&cfg.control))
        .with_safety(SafetyCfg::from(&cfg.safety))
        .with_loop(loop_cfg)
        .build()?;

    let backend = backend_name();
    tracing::info!(backend, tick_hz = loop_cfg.tick_hz, "rover assembled");
    Ok(Stack {
        rover,
        backend,
        sim_pad,
    })
}

pub fn run_drive(
    stack: &mut Stack,
    max_ticks: Option<u64>,
    stats: bool,
    rt: RtOpts,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<LoopStats> {
    setup_rt_once(rt);

    let params = RunParams {
        loop_cfg: stack.rover.loop_cfg(),
        max_ticks,
    };
    let clock = MonotonicClock::new();
    let result = rover_core::runner::run(
        stack.rover.orchestrator_mut(),
        &clock,
        params,
        &shutdown,
    );
    let loop_stats = result?;
    if stats {
        print_stats(&loop_stats);
    }
    Ok(loop_stats)
}

/// Begin, run one cycle, shut down. Returns the state after that cycle.
pub fn one_cycle(stack: &mut Stack) -> eyre::Result<rover_core::SafetyState> {
    stack.rover.begin(0)?;
    let report = stack.rover.tick(0);
    let stop = stack.rover.shutdown();
    let report = report?;
    stop?;
    Ok(report.state)
}

pub fn health_json(stack: &Stack, state: rover_core::SafetyState) -> String {
    let t = stack.rover.transform();
    serde_json::json!({
        "status": "ok",
        "backend": stack.backend,
        "state": state.as_str(),
        "tick_hz": stack.rover.loop_cfg().tick_hz,
        "watchdog_timeout_ms": stack.rover.gate().watchdog().timeout_ms(),
        "deadzone": t.deadzone(),
        "min_speed": t.min_speed(),
        "max_speed": t.max_speed(),
    })
    .to_string()
}

/// Print latency/jitter stats to stderr.
fn print_stats(s: &LoopStats) {
    eprintln!("\n--- Rover Stats ---");
    eprintln!("Ticks: {}", s.ticks);
    eprintln!("Period (us): {}", s.period_us);
    eprintln!(
        "Latency min/avg/max (us): {} / {:.1} / {}",
        s.min_or_zero(),
        s.avg_us(),
        s.max_us
    );
    eprintln!("Missed deadlines (> period): {}", s.missed_deadlines);
    eprintln!("Actuator faults: {}", s.actuator_faults);
    eprintln!("-------------------\n");
}
