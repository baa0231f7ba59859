use rover_core::error::BuildError;
use rover_core::{LoopCfg, Rover, SafetyCfg, SafetyState, TransformCfg, build_rover};
use rover_hardware::{SimulatedActuator, SimulatedFeedback, SimulatedHub};
use rstest::rstest;

fn expect_build_error(err: eyre::Report) -> BuildError {
    err.downcast_ref::<BuildError>()
        .cloned()
        .unwrap_or_else(|| panic!("expected BuildError, got: {err:?}"))
}

#[rstest]
fn missing_hub_yields_typed_build_error() {
    let err = Rover::builder()
        .with_actuator(SimulatedActuator::new())
        .try_build()
        .expect_err("should fail with MissingHub");
    assert!(matches!(expect_build_error(err), BuildError::MissingHub));
}

#[rstest]
fn missing_actuator_yields_typed_build_error() {
    let err = Rover::builder()
        .with_hub(SimulatedHub::new(1))
        .try_build()
        .expect_err("should fail with MissingActuator");
    assert!(matches!(expect_build_error(err), BuildError::MissingActuator));
}

#[rstest]
#[case(TransformCfg { deadzone: 512, ..TransformCfg::default() }, SafetyCfg::default(), LoopCfg::default())]
#[case(TransformCfg { deadzone: -3, ..TransformCfg::default() }, SafetyCfg::default(), LoopCfg::default())]
#[case(TransformCfg::default(), SafetyCfg { watchdog_timeout_ms: 0 }, LoopCfg::default())]
#[case(TransformCfg::default(), SafetyCfg::default(), LoopCfg { tick_hz: 0 })]
fn invalid_config_is_rejected(
    #[case] transform: TransformCfg,
    #[case] safety: SafetyCfg,
    #[case] loop_cfg: LoopCfg,
) {
    let err = Rover::builder()
        .with_hub(SimulatedHub::new(1))
        .with_actuator(SimulatedActuator::new())
        .with_transform(transform)
        .with_safety(safety)
        .with_loop(loop_cfg)
        .build()
        .expect_err("invalid config");
    assert!(matches!(
        expect_build_error(err),
        BuildError::InvalidConfig(_)
    ));

    let err = build_rover(
        SimulatedHub::new(1),
        SimulatedActuator::new(),
        SimulatedFeedback::new(),
        transform,
        safety,
        loop_cfg,
    )
    .expect_err("same validation for the generic constructor");
    assert!(matches!(
        expect_build_error(err),
        BuildError::InvalidConfig(_)
    ));
}

#[rstest]
fn builder_defaults_feedback_and_starts_disconnected() {
    let mut rover = Rover::builder()
        .with_hub(SimulatedHub::new(2))
        .with_actuator(SimulatedActuator::new())
        .with_watchdog_timeout_ms(750)
        .build()
        .expect("valid rover");
    assert_eq!(rover.state(), SafetyState::Disconnected);
    assert_eq!(rover.gate().watchdog().timeout_ms(), 750);
    assert_eq!(rover.loop_cfg(), LoopCfg::default());

    rover.begin(0).unwrap();
    let report = rover.tick(10).unwrap();
    assert_eq!(report.sources, 0);
    rover.shutdown().unwrap();
}
