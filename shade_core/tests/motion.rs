use shade_core::mocks::{BenchRig, RigDriver, RigLimit};
use shade_core::{MotionCfg, MotionController, MotionEvent, MotionState, TargetHandle};
use shade_traits::{Direction, LimitSensor, StepDriver};

fn controller(
    rig: &BenchRig,
    cfg: MotionCfg,
    target: &TargetHandle,
) -> MotionController<RigDriver, RigLimit> {
    MotionController::new(rig.driver(), rig.limit(), cfg, target.clone())
        .expect("build controller")
}

/// Tick until the given event shows up, with a hard budget so a stalled
/// machine fails the test instead of hanging it.
fn drive_until_event(
    ctl: &mut MotionController<RigDriver, RigLimit>,
    wanted: MotionEvent,
    budget: u64,
) -> u64 {
    for n in 0..budget {
        if ctl.tick().expect("tick ok") == wanted {
            return n;
        }
    }
    panic!("no {wanted:?} within {budget} ticks (state {:?})", ctl.state());
}

#[test]
fn boot_enables_driver_and_starts_homing() {
    let rig = BenchRig::new(5, 0);
    let target = TargetHandle::new(0);
    let ctl = controller(&rig, MotionCfg::default(), &target);
    assert!(rig.enabled());
    assert_eq!(ctl.state(), MotionState::HomeSeekFast);
    assert_eq!(ctl.current_position(), -1);
}

#[test]
fn homing_visits_states_in_order_then_parks_closed() {
    let rig = BenchRig::new(3, 0);
    let target = TargetHandle::new(0);
    let mut ctl = controller(&rig, MotionCfg::default(), &target);

    let mut states = vec![ctl.state()];
    let mut home_complete_at = None;
    let mut move_complete = false;
    for n in 0..10_000u64 {
        let ev = ctl.tick().expect("tick ok");
        if states.last() != Some(&ctl.state()) {
            states.push(ctl.state());
        }
        match ev {
            MotionEvent::HomeComplete => {
                home_complete_at = Some(n);
                // Reference established exactly at the switch.
                assert_eq!(ctl.current_position(), 0);
                assert_eq!(rig.position(), 0);
                assert_eq!(target.get(), 10);
                assert!(!rig.enabled(), "driver released at home");
            }
            MotionEvent::MoveComplete => {
                move_complete = true;
                break;
            }
            _ => {}
        }
    }

    assert!(home_complete_at.is_some(), "homing never completed");
    assert!(move_complete, "park move never completed");
    assert_eq!(
        states,
        vec![
            MotionState::HomeSeekFast,
            MotionState::HomeBackoff,
            MotionState::HomeSeekSlow,
            MotionState::Idle,
            MotionState::Moving,
            MotionState::Idle,
        ]
    );
    // Parked at the closed endpoint after homing.
    assert_eq!(ctl.current_position(), 10);
    assert_eq!(rig.position(), 10);
    assert!(!rig.enabled());
}

#[test]
fn home_seek_steps_every_speed_home_ticks() {
    let rig = BenchRig::new(5, 0);
    let target = TargetHandle::new(0);
    let mut ctl = controller(&rig, MotionCfg::default(), &target);

    let mut step_ticks = Vec::new();
    let mut last_steps = rig.steps();
    for n in 0..1_300u64 {
        ctl.tick().expect("tick ok");
        if rig.steps() != last_steps {
            last_steps = rig.steps();
            step_ticks.push(n);
        }
    }
    assert_eq!(step_ticks, vec![0, 300, 600, 900, 1200]);
}

/// Fast-homing config for tests that only care about the mover.
fn quick_home_cfg() -> MotionCfg {
    MotionCfg {
        speed_home: 1,
        ..MotionCfg::default()
    }
}

fn homed(
    rig: &BenchRig,
    target: &TargetHandle,
) -> MotionController<RigDriver, RigLimit> {
    let mut ctl = controller(rig, quick_home_cfg(), target);
    drive_until_event(&mut ctl, MotionEvent::HomeComplete, 1_000);
    ctl
}

#[test]
fn short_move_decelerates_past_speed_init() {
    let rig = BenchRig::new(2, 0);
    let target = TargetHandle::new(0);
    let mut ctl = homed(&rig, &target);

    // Override the park target before the Idle tick picks it up.
    target.set(3);
    let mut speeds = Vec::new();
    for _ in 0..1_000u64 {
        match ctl.tick().expect("tick ok") {
            MotionEvent::Stepped { speed } => speeds.push(speed),
            MotionEvent::MoveComplete => break,
            _ => {}
        }
    }

    assert_eq!(speeds, vec![100, 97, 100]);
    // The final deceleration bump lands above speed_init; there is no
    // ceiling on purpose.
    assert_eq!(ctl.current_speed(), 103);
    assert_eq!(ctl.current_position(), 3);
}

#[test]
fn long_move_ramps_to_cruise_and_back() {
    let rig = BenchRig::new(2, 0);
    let target = TargetHandle::new(0);
    let mut ctl = homed(&rig, &target);

    target.set(56);
    let mut speeds = Vec::new();
    for _ in 0..20_000u64 {
        match ctl.tick().expect("tick ok") {
            MotionEvent::Stepped { speed } => speeds.push(speed),
            MotionEvent::MoveComplete => break,
            _ => {}
        }
    }

    assert_eq!(speeds.len(), 56);
    assert_eq!(speeds[0], 100);
    // The ramp steps over the exact cruise value: 31 is still above the
    // floor, so one more decrement lands at 28.
    assert_eq!(*speeds.iter().min().expect("speeds non-empty"), 28);
    assert!(*speeds.last().expect("speeds non-empty") > 28);
    assert_eq!(ctl.current_position(), 56);
    assert_eq!(rig.position(), 56);
}

#[test]
fn moving_respects_step_timer_cadence() {
    let rig = BenchRig::new(2, 0);
    let target = TargetHandle::new(0);
    let mut ctl = homed(&rig, &target);

    target.set(2);
    let mut step_ticks = Vec::new();
    let mut last_steps = rig.steps();
    for n in 0..1_000u64 {
        if ctl.tick().expect("tick ok") == MotionEvent::MoveComplete {
            break;
        }
        if rig.steps() != last_steps {
            last_steps = rig.steps();
            step_ticks.push(n);
        }
    }
    // One tick for the Idle -> Moving transition, then the first step fires;
    // the second waits out the initial ticks-per-step value.
    assert_eq!(step_ticks, vec![1, 101]);
}

#[test]
fn move_in_negative_direction_completes() {
    let rig = BenchRig::new(2, 0);
    let target = TargetHandle::new(0);
    let mut ctl = homed(&rig, &target);

    target.set(12);
    drive_until_event(&mut ctl, MotionEvent::MoveComplete, 5_000);
    assert_eq!(ctl.current_position(), 12);

    target.set(4);
    drive_until_event(&mut ctl, MotionEvent::MoveComplete, 5_000);
    assert_eq!(ctl.current_position(), 4);
    assert_eq!(rig.position(), 4);
}

#[test]
fn rehome_reenters_homing_without_resetting_position() {
    let rig = BenchRig::new(2, 0);
    let target = TargetHandle::new(0);
    let mut ctl = homed(&rig, &target);
    drive_until_event(&mut ctl, MotionEvent::MoveComplete, 5_000);
    assert_eq!(ctl.current_position(), 10);

    target.request_rehome();
    ctl.tick().expect("tick ok");
    assert_eq!(ctl.state(), MotionState::HomeSeekFast);
    assert!(rig.enabled());
    // Position is carried over until the slow seek re-references it.
    assert_eq!(ctl.current_position(), 10);
}

#[test]
fn rehome_mid_move_does_not_arrest_the_move() {
    let rig = BenchRig::new(2, 0);
    let target = TargetHandle::new(0);
    let mut ctl = homed(&rig, &target);

    target.set(40);
    // Let the move get going.
    for _ in 0..500u64 {
        ctl.tick().expect("tick ok");
    }
    assert_eq!(ctl.state(), MotionState::Moving);
    let mid = ctl.current_position();
    assert!(mid > 0 && mid < 40);

    target.request_rehome();
    ctl.tick().expect("tick ok");
    // The controller switches straight to homing; nothing winds the move
    // down first.
    assert_eq!(ctl.state(), MotionState::HomeSeekFast);
    assert_eq!(ctl.current_position(), mid);

    drive_until_event(&mut ctl, MotionEvent::HomeComplete, 10_000);
    assert_eq!(ctl.current_position(), 0);
}

#[test]
fn driver_error_propagates_from_tick() {
    struct FailingDriver;
    impl StepDriver for FailingDriver {
        fn step(
            &mut self,
            _dir: Direction,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err("boom".into())
        }
        fn set_enabled(
            &mut self,
            _enabled: bool,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }
    struct OpenSwitch;
    impl LimitSensor for OpenSwitch {
        fn is_triggered(&mut self) -> bool {
            false
        }
    }

    let target = TargetHandle::new(0);
    let mut ctl =
        MotionController::new(FailingDriver, OpenSwitch, MotionCfg::default(), target)
            .expect("build controller");
    let err = ctl.tick().expect_err("step failure should propagate");
    let msg = format!("{err:#}");
    assert!(msg.contains("driver error"), "unexpected error: {msg}");
}

#[test]
fn invalid_configs_are_rejected() {
    let rig = BenchRig::new(0, 0);
    let target = TargetHandle::new(0);

    let bad_speed = MotionCfg {
        speed_goto: 200,
        ..MotionCfg::default()
    };
    let err = MotionController::new(rig.driver(), rig.limit(), bad_speed, target.clone())
        .err()
        .expect("speed_goto above speed_init must be rejected");
    assert!(format!("{err:#}").contains("invalid config"));

    let bad_endpoints = MotionCfg {
        closed: 60,
        ..MotionCfg::default()
    };
    assert!(
        MotionController::new(rig.driver(), rig.limit(), bad_endpoints, target.clone()).is_err()
    );

    let bad_accel = MotionCfg {
        accel: 0,
        ..MotionCfg::default()
    };
    assert!(MotionController::new(rig.driver(), rig.limit(), bad_accel, target).is_err());
}
