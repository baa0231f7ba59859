use proptest::prelude::*;
use rover_core::transform::{apply_deadzone, base_speed, process};
use rover_core::{RawInputSnapshot, TransformCfg};

fn snap(x: i32, y: i32, trigger: i32) -> RawInputSnapshot {
    RawInputSnapshot {
        axis_x: x,
        axis_y: y,
        throttle: trigger,
        ..RawInputSnapshot::default()
    }
}

prop_compose! {
    fn tunables()(min in 0i32..=255)(min in Just(min), max in min..=255, dz in 0i32..128) -> TransformCfg {
        TransformCfg { deadzone: dz, min_speed: min, max_speed: max }
    }
}

/// Tunables plus stick values strictly inside their deadzone.
fn inside_deadzone() -> impl Strategy<Value = (TransformCfg, i32, i32, i32)> {
    tunables().prop_flat_map(|cfg| {
        let r = (cfg.deadzone - 1).max(0);
        (Just(cfg), -r..=r, -r..=r, 0i32..=1023)
    })
}

proptest! {
    #[test]
    fn centred_inputs_are_idle((cfg, x, y, t) in inside_deadzone()) {
        let cmd = process(&snap(x, y, t), &cfg);
        prop_assert!(!cmd.valid);
        prop_assert_eq!((cmd.left, cmd.right), (0, 0));
    }

    #[test]
    fn deadzone_is_symmetric(v in -512i32..=512, dz in 0i32..512) {
        prop_assert_eq!(apply_deadzone(-v, dz), -apply_deadzone(v, dz));
    }

    #[test]
    fn pure_forward_drives_tracks_equally(cfg in tunables(), y in -512i32..=512, t in 0i32..=1023) {
        prop_assume!(y.abs() >= cfg.deadzone && y != 0);
        let cmd = process(&snap(0, y, t), &cfg);
        prop_assert!(cmd.valid);
        prop_assert_eq!(cmd.left, cmd.right);
        prop_assert!(cmd.left == 0 || cmd.left.signum() == y.signum());
    }

    #[test]
    fn pure_pivot_counter_rotates(cfg in tunables(), x in -512i32..=512, t in 0i32..=1023) {
        prop_assume!(x.abs() >= cfg.deadzone && x != 0);
        let cmd = process(&snap(x, 0, t), &cfg);
        prop_assert!(cmd.valid);
        prop_assert_eq!(cmd.left, -cmd.right);
        prop_assert!(cmd.left == 0 || cmd.left.signum() == x.signum());
    }

    #[test]
    fn output_never_exceeds_max_speed(
        cfg in tunables(),
        x in -512i32..=512,
        y in -512i32..=512,
        t in 0i32..=1023,
    ) {
        let cmd = process(&snap(x, y, t), &cfg);
        prop_assert!(cmd.left.abs() <= cfg.max_speed);
        prop_assert!(cmd.right.abs() <= cfg.max_speed);
    }

    #[test]
    fn out_of_range_raw_values_still_clamp(
        cfg in tunables(),
        x in any::<i32>(),
        y in any::<i32>(),
        t in any::<i32>(),
    ) {
        let cmd = process(&snap(x, y, t), &cfg);
        prop_assert!(cmd.left.abs() <= cfg.max_speed);
        prop_assert!(cmd.right.abs() <= cfg.max_speed);
    }

    #[test]
    fn arbitrary_raw_tunables_never_panic(
        deadzone in any::<i32>(),
        min_speed in any::<i32>(),
        max_speed in any::<i32>(),
        x in any::<i32>(),
        y in any::<i32>(),
        t in any::<i32>(),
    ) {
        let cfg = TransformCfg { deadzone, min_speed, max_speed };
        let cmd = process(&snap(x, y, t), &cfg);
        let bound = max_speed.clamp(0, 255);
        prop_assert!(cmd.left.abs() <= bound);
        prop_assert!(cmd.right.abs() <= bound);
    }

    #[test]
    fn base_speed_is_monotone_in_trigger(cfg in tunables(), a in 0i32..=1023, b in 0i32..=1023) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            base_speed(lo, cfg.min_speed, cfg.max_speed)
                <= base_speed(hi, cfg.min_speed, cfg.max_speed)
        );
    }
}

#[test]
fn full_deflection_full_trigger_stays_in_range() {
    let cfg = TransformCfg::default();
    let cmd = process(&snap(512, 512, 1023), &cfg);
    assert!(cmd.valid);
    assert_eq!((cmd.left, cmd.right), (255, 127));
}
