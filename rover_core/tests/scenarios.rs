//! Whole-cycle behaviour with simulated hub, drive stage and feedback.

use rover_core::orchestrator::tone;
use rover_core::{
    DriveOutput, LoopCfg, SafetyCfg, SafetyState, TickOrchestrator, TransformCfg,
    build_rover,
};
use rover_hardware::{
    Button, MotorState, SimulatedActuator, SimulatedFeedback, SimulatedGamepad, SimulatedHub,
};
use rstest::{fixture, rstest};

type SimRover = TickOrchestrator<SimulatedHub, SimulatedActuator, SimulatedFeedback>;

struct Rig {
    rover: SimRover,
    pads: Vec<SimulatedGamepad>,
    act: SimulatedActuator,
    fb: SimulatedFeedback,
}

impl Rig {
    fn new(slots: usize) -> Self {
        let hub = SimulatedHub::new(slots);
        let pads = (0..slots).filter_map(|s| hub.pad(s)).collect();
        let act = SimulatedActuator::new();
        let fb = SimulatedFeedback::new();
        let mut rover = build_rover(
            hub,
            act.clone(),
            fb.clone(),
            TransformCfg::default(),
            SafetyCfg::default(),
            LoopCfg::default(),
        )
        .expect("valid config");
        rover.begin(0).expect("begin");
        Self {
            rover,
            pads,
            act,
            fb,
        }
    }

    fn pad(&self) -> &SimulatedGamepad {
        &self.pads[0]
    }

    fn tick(&mut self, now: u64) -> rover_core::TickReport {
        self.rover.tick(now).expect("tick")
    }

    /// Connect pad 0 at t=10 and arm it with an A press (t=20) and release (t=25).
    fn armed(mut self) -> Self {
        self.pad().connect();
        self.tick(10);
        self.pad().press(Button::A);
        self.tick(20);
        self.pad().release(Button::A);
        self.tick(25);
        assert_eq!(self.rover.state(), SafetyState::ConnectedArmed);
        self
    }
}

#[fixture]
fn rig() -> Rig {
    Rig::new(1)
}

#[rstest]
fn begin_enables_stops_and_plays_startup(rig: Rig) {
    assert!(rig.act.motors_enabled());
    assert_eq!(rig.act.stop_calls(), 1);
    assert_eq!(rig.fb.tones(), tone::STARTUP.to_vec());
    assert_eq!(rig.rover.state(), SafetyState::Disconnected);
}

#[rstest]
fn armed_forward_drives_both_tracks_equally(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().set_stick(0, 300);
    rig.pad().set_throttle(1023);
    let report = rig.tick(30);

    // 300/512 * 255 = 149.4 -> 149
    assert_eq!(
        report.output,
        Some(DriveOutput::Driving {
            left: 149,
            right: 149
        })
    );
    let expected = MotorState {
        speed: 149,
        forward: true,
        enabled: true,
    };
    assert_eq!(rig.act.left(), expected);
    assert_eq!(rig.act.right(), expected);
}

#[rstest]
fn disarmed_controller_cannot_move_motors(rig: Rig) {
    let mut rig = rig;
    rig.pad().connect();
    rig.pad().set_stick(0, 300);
    rig.pad().set_throttle(1023);
    let report = rig.tick(10);

    assert_eq!(report.state, SafetyState::ConnectedDisarmed);
    assert_eq!(report.output, Some(DriveOutput::Stopped));
    assert_eq!(rig.act.left().speed, 0);
    assert_eq!(rig.act.right().speed, 0);
    assert_eq!(rig.act.set_calls(), 0);
}

#[rstest]
fn held_y_stops_on_the_same_cycle(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().set_stick(0, 300);
    rig.tick(30);
    assert!(rig.act.left().speed > 0);

    rig.fb.clear_tones();
    rig.pad().press(Button::Y);
    let report = rig.tick(40);
    assert_eq!(report.state, SafetyState::EmergencyStop);
    assert_eq!(report.output, Some(DriveOutput::Stopped));
    assert_eq!(rig.act.left(), MotorState::STOPPED);
    assert_eq!(rig.act.right(), MotorState::STOPPED);

    // Level-triggered: alarm repeats for every held cycle.
    rig.tick(50);
    rig.tick(60);
    assert_eq!(rig.fb.tones(), vec![tone::ALARM; 3]);
}

#[rstest]
fn emergency_stop_latches_until_a_edge(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().press(Button::Y);
    rig.tick(30);
    rig.pad().release(Button::Y);
    rig.pad().set_stick(0, 400);
    let report = rig.tick(40);
    assert_eq!(report.state, SafetyState::EmergencyStop);
    assert_eq!(rig.act.left().speed, 0);

    rig.pad().press(Button::A);
    let report = rig.tick(50);
    assert_eq!(report.state, SafetyState::ConnectedDisarmed);
    assert_eq!(rig.fb.tones().last(), Some(&tone::DISARM));
    assert_eq!(rig.act.left().speed, 0);
}

#[rstest]
fn a_held_through_y_release_does_not_clear(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().press(Button::Y);
    rig.tick(30);
    rig.pad().press(Button::A);
    rig.tick(40);
    rig.pad().release(Button::Y);
    rig.tick(50);
    assert_eq!(rig.rover.state(), SafetyState::EmergencyStop);

    rig.pad().release(Button::A);
    rig.tick(60);
    rig.pad().press(Button::A);
    rig.tick(70);
    assert_eq!(rig.rover.state(), SafetyState::ConnectedDisarmed);
}

#[rstest]
fn a_toggles_between_armed_and_disarmed(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().press(Button::A);
    rig.tick(30);
    assert_eq!(rig.rover.state(), SafetyState::ConnectedDisarmed);
    assert_eq!(rig.fb.tones().last(), Some(&tone::DISARM));
    // Holding A is not a second press.
    rig.tick(40);
    assert_eq!(rig.rover.state(), SafetyState::ConnectedDisarmed);
    rig.pad().release(Button::A);
    rig.tick(50);
    rig.pad().press(Button::A);
    rig.tick(60);
    assert_eq!(rig.rover.state(), SafetyState::ConnectedArmed);
    assert_eq!(rig.fb.tones().last(), Some(&tone::ARM));
}

#[rstest]
fn silent_link_loss_trips_the_watchdog(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().set_stick(0, 300);
    rig.tick(30);
    rig.pad().drop_silently();

    // Last activity at 30; 2000ms later is still within the window.
    let report = rig.tick(2030);
    assert_eq!(report.state, SafetyState::ConnectedArmed);
    assert_eq!(report.sources, 0);

    let report = rig.tick(2031);
    assert_eq!(report.state, SafetyState::Disconnected);
    assert_eq!(report.output, Some(DriveOutput::Stopped));
    assert_eq!(rig.act.left(), MotorState::STOPPED);
    assert!(!rig.rover.gate().is_connected());
}

#[rstest]
fn disconnect_notification_stops_and_beeps(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().set_stick(0, 300);
    rig.tick(30);

    rig.pad().disconnect();
    let report = rig.tick(40);
    assert_eq!(report.state, SafetyState::Disconnected);
    assert_eq!(rig.act.left(), MotorState::STOPPED);
    assert_eq!(rig.fb.tones().last(), Some(&tone::DISCONNECT));
}

#[rstest]
fn emergency_stop_survives_reconnect(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().press(Button::Y);
    rig.tick(30);
    rig.pad().release(Button::Y);
    rig.pad().disconnect();
    rig.tick(40);
    assert_eq!(rig.rover.state(), SafetyState::EmergencyStop);

    rig.pad().connect();
    let report = rig.tick(50);
    assert_eq!(report.state, SafetyState::EmergencyStop);
    assert!(rig.rover.gate().is_connected());
}

#[rstest]
fn b_sounds_horn_and_x_toggles_light_on_edges(rig: Rig) {
    let mut rig = rig;
    rig.pad().connect();
    rig.tick(10);
    rig.fb.clear_tones();

    rig.pad().press(Button::B);
    rig.pad().press(Button::X);
    rig.tick(20);
    rig.tick(30);
    assert_eq!(rig.fb.tones(), vec![tone::HORN]);
    assert!(rig.fb.light());

    rig.pad().release(Button::X);
    rig.tick(40);
    rig.pad().press(Button::X);
    rig.tick(50);
    assert!(!rig.fb.light());
}

#[rstest]
fn last_slot_wins_and_partial_disconnect_keeps_link() {
    let rig = Rig::new(2);
    let second = rig.pads[1].clone();
    second.connect();
    let mut rig = rig.armed();
    rig.pad().set_stick(0, 300);
    rig.pad().set_throttle(1023);
    second.set_stick(0, -300);
    second.set_throttle(1023);

    let report = rig.tick(30);
    assert_eq!(report.sources, 2);
    assert_eq!(
        report.output,
        Some(DriveOutput::Driving {
            left: -149,
            right: -149
        })
    );
    assert!(!rig.act.left().forward);

    second.disconnect();
    let report = rig.tick(40);
    assert_eq!(report.state, SafetyState::ConnectedArmed);
    assert_eq!(report.sources, 1);
    assert!(rig.act.left().forward);
}

#[rstest]
fn actuator_fault_stops_cycle_and_next_tick_drives(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().set_stick(0, 300);
    rig.act.fail_next_set("overcurrent");
    let stops_before = rig.act.stop_calls();

    let report = rig.tick(30);
    assert_eq!(report.output, Some(DriveOutput::Stopped));
    assert_eq!(report.actuator_faults, 1);
    assert_eq!(report.state, SafetyState::ConnectedArmed);
    assert!(rig.act.stop_calls() > stops_before);
    // The rest of the cycle still ran.
    assert_eq!(rig.fb.serviced_at(), Some(30));

    let report = rig.tick(40);
    assert_eq!(report.actuator_faults, 0);
    assert!(matches!(report.output, Some(DriveOutput::Driving { .. })));
    assert_eq!(rig.rover.actuator_faults(), 1);
}

#[rstest]
fn tunables_change_between_ticks(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().set_stick(0, 512);
    rig.pad().set_throttle(1023);
    rig.tick(30);
    assert_eq!(rig.act.left().speed, 255);

    rig.rover.transform_mut().set_speed_limits(0, 100);
    rig.tick(40);
    assert_eq!(rig.act.left().speed, 100);
}

#[rstest]
fn status_led_is_solid_when_armed(rig: Rig) {
    let mut rig = rig.armed();
    rig.tick(30);
    assert!(rig.fb.status_led());
    assert_eq!(rig.fb.serviced_at(), Some(30));
}

#[rstest]
fn shutdown_disables_the_drive_stage(rig: Rig) {
    let mut rig = rig.armed();
    rig.pad().set_stick(0, 300);
    rig.tick(30);
    rig.rover.shutdown().unwrap();
    assert!(!rig.act.motors_enabled());
    assert_eq!(rig.act.left(), MotorState::STOPPED);
}
