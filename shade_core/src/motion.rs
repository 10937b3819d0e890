//! Homing and point-to-point motion control.
//!
//! The controller owns the stepper driver and the limit sensor and is driven
//! once per scheduler tick. Homing runs a three-stage seek against the limit
//! switch; moves run a trapezoidal speed profile expressed in ticks-per-step.

use crate::error::{BuildError, MotionError, Result};
use crate::shared::TargetHandle;
use eyre::WrapErr;
use shade_traits::{Direction, LimitSensor, StepDriver};

/// Motion constants, all in steps and ticks-per-step.
#[derive(Debug, Clone, Copy)]
pub struct MotionCfg {
    /// Total travel in steps from the home switch.
    pub range: i32,
    /// Open endpoint in steps.
    pub open: i32,
    /// Closed endpoint in steps; parking target after homing.
    pub closed: i32,
    /// Ticks per step at the start of a move.
    pub speed_init: u32,
    /// Ticks per step while homing.
    pub speed_home: u32,
    /// Cruise floor in ticks per step.
    pub speed_goto: u32,
    /// Ticks-per-step change applied per step while ramping.
    pub accel: u32,
}

impl Default for MotionCfg {
    fn default() -> Self {
        Self {
            range: 56,
            open: 56,
            closed: 10,
            speed_init: 100,
            speed_home: 300,
            speed_goto: 30,
            accel: 3,
        }
    }
}

impl From<&shade_config::Motion> for MotionCfg {
    fn from(m: &shade_config::Motion) -> Self {
        Self {
            range: m.range,
            open: m.open,
            closed: m.closed,
            speed_init: m.speed_init,
            speed_home: m.speed_home,
            speed_goto: m.speed_goto,
            accel: m.accel,
        }
    }
}

/// Controller state. Exactly one variant is active; homing visits its three
/// sub-states strictly in order before reaching `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    /// Seek the limit switch in the negative direction.
    HomeSeekFast,
    /// Back off positive until the switch releases.
    HomeBackoff,
    /// Approach the switch again for the final reference.
    HomeSeekSlow,
    Idle,
    Moving,
}

/// What a single tick produced. The runner renders these as status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    None,
    /// A step was issued while `Moving`; carries the ticks-per-step value in
    /// effect when the step fired. Homing steps are not reported.
    Stepped { speed: u32 },
    HomeComplete,
    MoveComplete,
}

pub struct MotionController<D: StepDriver, L: LimitSensor> {
    driver: D,
    limit: L,
    cfg: MotionCfg,
    target: TargetHandle,
    state: MotionState,
    current_position: i32,
    current_speed: u32,
    step_timer: u32,
}

impl<D: StepDriver, L: LimitSensor> core::fmt::Debug for MotionController<D, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotionController")
            .field("state", &self.state)
            .field("current_position", &self.current_position)
            .field("target_position", &self.target.get())
            .field("current_speed", &self.current_speed)
            .finish()
    }
}

impl<D: StepDriver, L: LimitSensor> MotionController<D, L> {
    /// Validate the config, enable the driver and start in `HomeSeekFast`
    /// with the pre-home position sentinel.
    pub fn new(driver: D, limit: L, cfg: MotionCfg, target: TargetHandle) -> Result<Self> {
        if cfg.range <= 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "range must be > 0",
            )));
        }
        if cfg.closed < 0 || cfg.closed > cfg.open || cfg.open > cfg.range {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "endpoints must satisfy 0 <= closed <= open <= range",
            )));
        }
        if cfg.speed_init == 0 || cfg.speed_home == 0 || cfg.speed_goto == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "speeds must be > 0",
            )));
        }
        if cfg.speed_goto > cfg.speed_init {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "speed_goto must be <= speed_init",
            )));
        }
        if cfg.accel == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "accel must be > 0",
            )));
        }

        let mut ctl = Self {
            driver,
            limit,
            cfg,
            target,
            state: MotionState::HomeSeekFast,
            current_position: -1,
            current_speed: cfg.speed_init,
            step_timer: 0,
        };
        ctl.enable().wrap_err("initial driver enable")?;
        Ok(ctl)
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn current_position(&self) -> i32 {
        self.current_position
    }

    pub fn current_speed(&self) -> u32 {
        self.current_speed
    }

    /// Best-effort driver disable, for shutdown paths outside the tick loop.
    pub fn disable_driver(&mut self) -> Result<()> {
        self.disable()
    }

    /// Advance the state machine by one scheduler tick.
    pub fn tick(&mut self) -> Result<MotionEvent> {
        if self.target.take_rehome() {
            // Re-home request from the command channel. The position is not
            // reset and an in-progress move is not arrested first.
            self.enable()?;
            tracing::debug!(from = ?self.state, "re-home requested");
            self.state = MotionState::HomeSeekFast;
        }

        let mut event = MotionEvent::None;
        match self.state {
            MotionState::HomeSeekFast => {
                if self.limit.is_triggered() {
                    tracing::debug!("limit found, backing off");
                    self.state = MotionState::HomeBackoff;
                } else if self.step_timer == 0 {
                    self.step(Direction::Minus)?;
                    self.step_timer = self.cfg.speed_home;
                }
            }
            MotionState::HomeBackoff => {
                if !self.limit.is_triggered() {
                    tracing::debug!("limit released, slow approach");
                    self.state = MotionState::HomeSeekSlow;
                } else if self.step_timer == 0 {
                    self.step(Direction::Plus)?;
                    self.step_timer = self.cfg.speed_home;
                }
            }
            MotionState::HomeSeekSlow => {
                if self.limit.is_triggered() {
                    self.current_position = 0;
                    self.target.set(self.cfg.closed);
                    self.disable()?;
                    self.state = MotionState::Idle;
                    event = MotionEvent::HomeComplete;
                    tracing::info!("homing complete");
                } else if self.step_timer == 0 {
                    self.step(Direction::Minus)?;
                    self.step_timer = self.cfg.speed_home;
                }
            }
            MotionState::Idle => {
                if self.target.get() != self.current_position {
                    self.current_speed = self.cfg.speed_init;
                    self.step_timer = 0;
                    self.enable()?;
                    self.state = MotionState::Moving;
                    tracing::debug!(
                        target = self.target.get(),
                        from = self.current_position,
                        "move start"
                    );
                }
            }
            MotionState::Moving => {
                if self.step_timer == 0 {
                    event = self.moving_step()?;
                }
            }
        }

        if self.step_timer > 0 {
            self.step_timer -= 1;
        }
        Ok(event)
    }

    /// One firing of the trapezoidal mover: issue a step toward the target,
    /// or finish the move when the target is reached.
    fn moving_step(&mut self) -> Result<MotionEvent> {
        let target = self.target.get();
        if target == self.current_position {
            self.disable()?;
            self.state = MotionState::Idle;
            tracing::debug!(position = self.current_position, "move complete");
            return Ok(MotionEvent::MoveComplete);
        }

        let speed = self.current_speed;
        let dir = if target > self.current_position {
            Direction::Plus
        } else {
            Direction::Minus
        };
        self.step(dir)?;
        self.step_timer = self.current_speed;

        // Remaining distance measured before the step just issued (the
        // post-step remainder plus one).
        let distance = (target - self.current_position).abs() + 1;

        // Deceleration look-ahead: the window is how many accel increments
        // fit between the current speed and the start speed. Signed math on
        // purpose; past speed_init the window goes non-positive and the
        // ordinary ramp branch pulls the speed back down. There is no
        // explicit ceiling, so a short move can end above speed_init.
        let window = (self.cfg.speed_init as i32 - self.current_speed as i32)
            / self.cfg.accel as i32
            + 1;
        if distance <= window {
            self.current_speed += self.cfg.accel;
        } else if self.current_speed > self.cfg.speed_goto {
            self.current_speed = self.current_speed.saturating_sub(self.cfg.accel);
        }

        Ok(MotionEvent::Stepped { speed })
    }

    /// Issue one step pulse and account for it. The only place the position
    /// changes, by exactly one.
    fn step(&mut self, dir: Direction) -> Result<()> {
        self.driver
            .step(dir)
            .map_err(|e| eyre::Report::new(MotionError::Driver(e.to_string())))
            .wrap_err("step pulse")?;
        self.current_position += dir.delta();
        Ok(())
    }

    fn enable(&mut self) -> Result<()> {
        self.driver
            .set_enabled(true)
            .map_err(|e| eyre::Report::new(MotionError::Driver(e.to_string())))
            .wrap_err("driver enable")
    }

    fn disable(&mut self) -> Result<()> {
        self.driver
            .set_enabled(false)
            .map_err(|e| eyre::Report::new(MotionError::Driver(e.to_string())))
            .wrap_err("driver disable")
    }
}
