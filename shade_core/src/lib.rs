#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core motion logic for the shade actuator (hardware-agnostic).
//!
//! All hardware interaction goes through `shade_traits::StepDriver` and
//! `shade_traits::LimitSensor`; the tick loop pacing goes through
//! `shade_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Motion**: homing state machine and trapezoidal point-to-point mover
//!   (`motion` module), driven once per scheduler tick
//! - **Gestures**: tap/hold classification for the two travel buttons
//!   (`gesture` module)
//! - **Commands**: single-character serial command mapping (`command`
//!   module)
//! - **Shared state**: target position and re-home requests cross execution
//!   contexts through single-word atomics (`shared` module)
//! - **Runner**: the cooperative tick loop that wires the above together
//!   and renders status lines (`runner` module)
//!
//! Speeds are expressed in ticks-per-step (1 tick = one scheduler period,
//! 1 ms at the default 1 kHz rate), so all profile arithmetic is integer.

pub mod command;
pub mod error;
pub mod gesture;
pub mod mocks;
pub mod motion;
pub mod runner;
pub mod shared;
pub mod util;

pub use command::CommandInterpreter;
pub use error::{BuildError, MotionError};
pub use gesture::{ButtonCfg, ButtonGesture, ButtonId};
pub use motion::{MotionCfg, MotionController, MotionEvent, MotionState};
pub use runner::RunnerOpts;
pub use shared::TargetHandle;
