use crossbeam_channel::unbounded;
use shade_core::mocks::BenchRig;
use shade_core::{
    ButtonCfg, ButtonGesture, CommandInterpreter, MotionCfg, MotionController, RunnerOpts,
    TargetHandle, runner,
};
use shade_traits::MonotonicClock;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Fast wall clock for tests: the loop still sleeps, but only 1us per tick.
fn opts(max_ticks: u64) -> RunnerOpts {
    RunnerOpts {
        tick_hz: 1_000_000,
        max_ticks: Some(max_ticks),
    }
}

#[test]
fn homes_parks_and_serves_a_position_command() {
    let rig = BenchRig::new(2, 0);
    let target = TargetHandle::new(0);
    let cfg = MotionCfg::default();
    let mut motion = MotionController::new(rig.driver(), rig.limit(), cfg, target.clone())
        .expect("build controller");
    let mut gesture = ButtonGesture::new(ButtonCfg::default(), &cfg, target.clone());
    let commands = CommandInterpreter::new(cfg.range, target.clone());

    let (char_tx, char_rx) = unbounded::<char>();
    let (_btn_tx, btn_rx) = unbounded::<(bool, bool)>();
    let clock = MonotonicClock::new();
    let stop = Arc::new(AtomicBool::new(false));
    let mut out = Vec::new();

    runner::run(
        &mut motion,
        &mut gesture,
        &commands,
        &char_rx,
        &btn_rx,
        &clock,
        &stop,
        &mut out,
        opts(8_000),
    )
    .expect("run ok");

    let text = String::from_utf8(out).expect("utf8 output");
    assert!(text.contains("HOME COMPLETE"), "output: {text}");
    assert!(text.contains("GOTO COMPLETE"), "output: {text}");
    assert_eq!(motion.current_position(), 10);

    // Serve an absolute position command on a second leg of the loop.
    char_tx.send('5').expect("send command");
    let mut out = Vec::new();
    runner::run(
        &mut motion,
        &mut gesture,
        &commands,
        &char_rx,
        &btn_rx,
        &clock,
        &stop,
        &mut out,
        opts(5_000),
    )
    .expect("run ok");

    let text = String::from_utf8(out).expect("utf8 output");
    assert!(text.contains("GOTO COMPLETE"), "output: {text}");
    assert_eq!(motion.current_position(), 30);
    assert_eq!(rig.position(), 30);
    // Every step while moving traces its ticks-per-step value.
    assert!(
        text.lines().any(|l| l.trim() == "100"),
        "missing speed trace: {text}"
    );
}

#[test]
fn button_tap_through_the_loop_moves_to_closed() {
    let rig = BenchRig::new(2, 0);
    let target = TargetHandle::new(0);
    let cfg = MotionCfg::default();
    let mut motion = MotionController::new(rig.driver(), rig.limit(), cfg, target.clone())
        .expect("build controller");
    let mut gesture = ButtonGesture::new(ButtonCfg::default(), &cfg, target.clone());
    let commands = CommandInterpreter::new(cfg.range, target.clone());

    let (char_tx, char_rx) = unbounded::<char>();
    let (btn_tx, btn_rx) = unbounded::<(bool, bool)>();
    let clock = MonotonicClock::new();
    let stop = Arc::new(AtomicBool::new(false));
    let mut out = Vec::new();

    // Home and park first.
    runner::run(
        &mut motion,
        &mut gesture,
        &commands,
        &char_rx,
        &btn_rx,
        &clock,
        &stop,
        &mut out,
        opts(8_000),
    )
    .expect("run ok");
    assert_eq!(motion.current_position(), 10);

    // Move open, then tap the close button.
    char_tx.send('9').expect("send command");
    btn_tx.send((true, false)).expect("send press");
    btn_tx.send((false, false)).expect("send release");
    let mut out = Vec::new();
    runner::run(
        &mut motion,
        &mut gesture,
        &commands,
        &char_rx,
        &btn_rx,
        &clock,
        &stop,
        &mut out,
        opts(8_000),
    )
    .expect("run ok");

    // Press and release landed in the same tick, well under the hold
    // threshold, so the tap wins over the position command.
    assert_eq!(target.get(), 10);
    assert_eq!(motion.current_position(), 10);
}

#[test]
fn stop_flag_halts_the_loop_immediately() {
    let rig = BenchRig::new(2, 0);
    let target = TargetHandle::new(0);
    let cfg = MotionCfg::default();
    let mut motion = MotionController::new(rig.driver(), rig.limit(), cfg, target.clone())
        .expect("build controller");
    let mut gesture = ButtonGesture::new(ButtonCfg::default(), &cfg, target.clone());
    let commands = CommandInterpreter::new(cfg.range, target.clone());

    let (_char_tx, char_rx) = unbounded::<char>();
    let (_btn_tx, btn_rx) = unbounded::<(bool, bool)>();
    let clock = MonotonicClock::new();
    let stop = Arc::new(AtomicBool::new(true));
    let mut out = Vec::new();

    let ticks = runner::run(
        &mut motion,
        &mut gesture,
        &commands,
        &char_rx,
        &btn_rx,
        &clock,
        &stop,
        &mut out,
        RunnerOpts::default(),
    )
    .expect("run ok");

    assert_eq!(ticks, 0);
    assert!(out.is_empty());
}
