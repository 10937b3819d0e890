//! Hardware backends for the shade actuator.
//!
//! The simulated rig is always available and backs the default CLI mode and
//! the test suites. The `hardware` feature adds a Raspberry Pi GPIO backend
//! built on `rppal`.

pub mod error;
#[cfg(feature = "hardware")]
pub mod gpio;

use shade_traits::{Direction, LimitSensor, StepDriver};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug)]
struct SimState {
    position: Cell<i32>,
    enabled: Cell<bool>,
    limit_zone: i32,
}

/// Simulated carriage on a rail. The limit switch closes whenever the
/// carriage is at or below `limit_zone`, mirroring a switch mounted at the
/// bottom of travel.
#[derive(Debug, Clone)]
pub struct SimulatedRig {
    state: Rc<SimState>,
}

impl SimulatedRig {
    pub fn new(start_position: i32, limit_zone: i32) -> Self {
        Self {
            state: Rc::new(SimState {
                position: Cell::new(start_position),
                enabled: Cell::new(false),
                limit_zone,
            }),
        }
    }

    pub fn driver(&self) -> SimDriver {
        SimDriver {
            state: self.state.clone(),
        }
    }

    pub fn limit(&self) -> SimLimit {
        SimLimit {
            state: self.state.clone(),
        }
    }

    pub fn position(&self) -> i32 {
        self.state.position.get()
    }

    pub fn enabled(&self) -> bool {
        self.state.enabled.get()
    }
}

/// Simulated step/direction driver; each pulse moves the carriage one step.
pub struct SimDriver {
    state: Rc<SimState>,
}

impl StepDriver for SimDriver {
    fn step(&mut self, dir: Direction) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pos = self.state.position.get() + dir.delta();
        self.state.position.set(pos);
        tracing::trace!(?dir, pos, "sim step");
        Ok(())
    }

    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.state.enabled.set(enabled);
        tracing::trace!(enabled, "sim driver enable");
        Ok(())
    }
}

/// Simulated limit switch.
pub struct SimLimit {
    state: Rc<SimState>,
}

impl LimitSensor for SimLimit {
    fn is_triggered(&mut self) -> bool {
        self.state.position.get() <= self.state.limit_zone
    }
}
