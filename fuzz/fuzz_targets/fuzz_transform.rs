#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use rover_core::transform::{InputTransform, RawInputSnapshot};
use rover_core::TransformCfg;

#[derive(Debug, Arbitrary)]
struct Input {
    axis_x: i32,
    axis_y: i32,
    throttle: i32,
    deadzone: i32,
    min_speed: i32,
    max_speed: i32,
}

fuzz_target!(|input: Input| {
    let mut t = InputTransform::new(TransformCfg::default());
    t.set_deadzone(input.deadzone);
    t.set_speed_limits(input.min_speed, input.max_speed);

    let snap = RawInputSnapshot {
        axis_x: input.axis_x,
        axis_y: input.axis_y,
        throttle: input.throttle,
        ..RawInputSnapshot::default()
    };
    let cmd = t.process(&snap);
    let max = t.max_speed();
    assert!(cmd.left.abs() <= max && cmd.right.abs() <= max);
    if !cmd.valid {
        assert_eq!((cmd.left, cmd.right), (0, 0));
    }
});
