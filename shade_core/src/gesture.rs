//! Tap/hold classification for the two travel buttons.
//!
//! A press shorter than the hold threshold is a tap and snaps the target to
//! the channel's endpoint on release. A press at or beyond the threshold
//! jogs the target while held, one channel per tick, close-button first.

use crate::motion::MotionCfg;
use crate::shared::TargetHandle;

/// Gesture thresholds, in ticks.
#[derive(Debug, Clone, Copy)]
pub struct ButtonCfg {
    /// A press shorter than this is a tap; at or beyond it, a hold.
    pub hold_threshold: u64,
    /// A holding channel jogs on ticks that are a multiple of this.
    pub hold_rate: u64,
    /// Steps moved per jog.
    pub jog_steps: i32,
}

impl Default for ButtonCfg {
    fn default() -> Self {
        Self {
            hold_threshold: 2000,
            hold_rate: 500,
            jog_steps: 1,
        }
    }
}

impl From<&shade_config::Buttons> for ButtonCfg {
    fn from(b: &shade_config::Buttons) -> Self {
        Self {
            hold_threshold: b.hold_threshold,
            hold_rate: b.hold_rate,
            jog_steps: b.jog_steps,
        }
    }
}

/// The two physical buttons. `Close` taps to the closed endpoint and jogs
/// negative; `Open` taps to the open endpoint and jogs positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Close,
    Open,
}

#[derive(Debug, Default, Clone, Copy)]
struct Channel {
    pressed: bool,
    press_start: u64,
}

pub struct ButtonGesture {
    cfg: ButtonCfg,
    closed: i32,
    open: i32,
    target: TargetHandle,
    close_btn: Channel,
    open_btn: Channel,
}

impl ButtonGesture {
    pub fn new(cfg: ButtonCfg, motion: &MotionCfg, target: TargetHandle) -> Self {
        Self {
            cfg,
            closed: motion.closed,
            open: motion.open,
            target,
            close_btn: Channel::default(),
            open_btn: Channel::default(),
        }
    }

    /// Record a press/release edge for one channel. Repeated samples of the
    /// same level are ignored, so feeding full level pairs per transition is
    /// safe.
    pub fn on_event(&mut self, id: ButtonId, pressed: bool, now: u64) {
        let ch = self.channel_mut(id);
        if pressed {
            if !ch.pressed {
                ch.pressed = true;
                ch.press_start = now;
            }
        } else if ch.pressed {
            let held = now.saturating_sub(ch.press_start);
            ch.pressed = false;
            if held < self.cfg.hold_threshold {
                let endpoint = match id {
                    ButtonId::Close => self.closed,
                    ButtonId::Open => self.open,
                };
                tracing::debug!(?id, endpoint, "tap");
                self.target.set(endpoint);
            }
        }
    }

    /// Record both levels as reported by the hardware layer on a physical
    /// transition of either button.
    pub fn on_pair(&mut self, close_pressed: bool, open_pressed: bool, now: u64) {
        self.on_event(ButtonId::Close, close_pressed, now);
        self.on_event(ButtonId::Open, open_pressed, now);
    }

    /// Resolve hold jogs for this tick. At most one channel adjusts the
    /// target per tick; the close button wins when both are holding.
    pub fn tick(&mut self, now: u64) {
        let hold_close = self.holding(self.close_btn, now);
        let hold_open = self.holding(self.open_btn, now);
        if !(hold_close || hold_open) || !now.is_multiple_of(self.cfg.hold_rate) {
            return;
        }

        if hold_close {
            let t = self.target.get();
            if t > self.closed {
                self.target.set((t - self.cfg.jog_steps).max(self.closed));
            }
        } else if hold_open {
            let t = self.target.get();
            if t < self.open {
                self.target.set((t + self.cfg.jog_steps).min(self.open));
            }
        }
    }

    fn holding(&self, ch: Channel, now: u64) -> bool {
        ch.pressed && now.saturating_sub(ch.press_start) >= self.cfg.hold_threshold
    }

    fn channel_mut(&mut self, id: ButtonId) -> &mut Channel {
        match id {
            ButtonId::Close => &mut self.close_btn,
            ButtonId::Open => &mut self.open_btn,
        }
    }
}
