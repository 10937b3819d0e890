//! Test and bench helpers: a simulated carriage on a rail with a limit
//! switch zone at the bottom of travel.

use shade_traits::{Direction, LimitSensor, StepDriver};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug)]
struct RigState {
    position: Cell<i32>,
    enabled: Cell<bool>,
    steps: Cell<u64>,
    limit_zone: i32,
}

/// Shared view of the simulated carriage. `driver()` and `limit()` hand out
/// the hardware-facing halves; the rig itself is the test's observation
/// point.
#[derive(Debug, Clone)]
pub struct BenchRig {
    state: Rc<RigState>,
}

impl BenchRig {
    /// Carriage at `start_position`; the switch reads triggered whenever the
    /// carriage is at or below `limit_zone`.
    pub fn new(start_position: i32, limit_zone: i32) -> Self {
        Self {
            state: Rc::new(RigState {
                position: Cell::new(start_position),
                enabled: Cell::new(false),
                steps: Cell::new(0),
                limit_zone,
            }),
        }
    }

    pub fn driver(&self) -> RigDriver {
        RigDriver {
            state: self.state.clone(),
        }
    }

    pub fn limit(&self) -> RigLimit {
        RigLimit {
            state: self.state.clone(),
        }
    }

    /// True physical carriage position, independent of the controller's
    /// step accounting.
    pub fn position(&self) -> i32 {
        self.state.position.get()
    }

    pub fn enabled(&self) -> bool {
        self.state.enabled.get()
    }

    /// Total pulses issued since construction.
    pub fn steps(&self) -> u64 {
        self.state.steps.get()
    }
}

pub struct RigDriver {
    state: Rc<RigState>,
}

impl StepDriver for RigDriver {
    fn step(&mut self, dir: Direction) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.state
            .position
            .set(self.state.position.get() + dir.delta());
        self.state.steps.set(self.state.steps.get() + 1);
        Ok(())
    }

    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.state.enabled.set(enabled);
        Ok(())
    }
}

pub struct RigLimit {
    state: Rc<RigState>,
}

impl LimitSensor for RigLimit {
    fn is_triggered(&mut self) -> bool {
        self.state.position.get() <= self.state.limit_zone
    }
}
