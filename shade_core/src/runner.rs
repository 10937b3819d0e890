//! The cooperative tick loop.
//!
//! Pacing, input draining and status rendering live here; the motion and
//! gesture components stay free of I/O. Per tick, strictly in order:
//! pending command characters, pending button transitions, one motion tick
//! (rendered to the output writer), one gesture tick.

use crate::command::CommandInterpreter;
use crate::error::Result;
use crate::gesture::ButtonGesture;
use crate::motion::{MotionController, MotionEvent};
use crossbeam_channel::Receiver;
use eyre::WrapErr;
use shade_traits::{Clock, LimitSensor, StepDriver};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RunnerOpts {
    /// Scheduler tick rate.
    pub tick_hz: u32,
    /// Stop after this many ticks; `None` runs until the stop flag is set.
    pub max_ticks: Option<u64>,
}

impl Default for RunnerOpts {
    fn default() -> Self {
        Self {
            tick_hz: 1000,
            max_ticks: None,
        }
    }
}

/// Drive the controller until the stop flag is set or the tick budget runs
/// out. Returns the number of ticks executed.
#[allow(clippy::too_many_arguments)]
pub fn run<D, L, C, W>(
    motion: &mut MotionController<D, L>,
    gesture: &mut ButtonGesture,
    commands: &CommandInterpreter,
    chars: &Receiver<char>,
    buttons: &Receiver<(bool, bool)>,
    clock: &C,
    stop: &Arc<AtomicBool>,
    out: &mut W,
    opts: RunnerOpts,
) -> Result<u64>
where
    D: StepDriver,
    L: LimitSensor,
    C: Clock,
    W: Write,
{
    let period = Duration::from_micros(crate::util::period_us(opts.tick_hz));
    tracing::info!(tick_hz = opts.tick_hz, "control loop start");

    let mut now: u64 = 0;
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if let Some(max) = opts.max_ticks
            && now >= max
        {
            break;
        }

        for ch in chars.try_iter() {
            commands.on_char(ch);
        }
        for (close_pressed, open_pressed) in buttons.try_iter() {
            gesture.on_pair(close_pressed, open_pressed, now);
        }

        match motion.tick()? {
            MotionEvent::None => {}
            MotionEvent::Stepped { speed } => {
                writeln!(out, "{speed}").wrap_err("status output")?;
            }
            MotionEvent::HomeComplete => {
                writeln!(out, "HOME COMPLETE").wrap_err("status output")?;
            }
            MotionEvent::MoveComplete => {
                writeln!(out, "GOTO COMPLETE").wrap_err("status output")?;
            }
        }

        gesture.tick(now);

        now += 1;
        clock.sleep(period);
    }

    tracing::info!(ticks = now, "control loop stop");
    Ok(now)
}
