#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and validation for the shade actuator controller.
//!
//! `Config` and sub-structs are deserialized from TOML and validated.
//! Every section and field has a default, so an empty document yields the
//! stock bench configuration.
use serde::Deserialize;

/// GPIO pin assignments (BCM numbering on the Raspberry Pi backend).
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Pins {
    pub step: u8,
    pub dir: u8,
    /// Enable line of the driver chip; driven low to enable.
    pub enable: u8,
    /// Limit switch input; pull-up, reads low when the switch closes.
    pub limit: u8,
    pub button_close: u8,
    pub button_open: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            step: 13,
            dir: 19,
            enable: 26,
            limit: 5,
            button_close: 20,
            button_open: 21,
        }
    }
}

/// Travel geometry and speed profile, all in steps and ticks-per-step.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Motion {
    /// Total travel in steps from the home switch.
    pub range: i32,
    /// Open endpoint in steps.
    pub open: i32,
    /// Closed endpoint in steps; also the parking target after homing.
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

impl Default for Motion {
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

/// Button gesture thresholds, in ticks.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Buttons {
    /// A press shorter than this is a tap; at or beyond it, a hold.
    pub hold_threshold: u64,
    /// A holding channel jogs on ticks that are a multiple of this.
    pub hold_rate: u64,
    /// Steps moved per jog.
    pub jog_steps: i32,
    /// Sampling period of the raw button inputs, in milliseconds.
    /// Owned by the hardware poller; the gesture core never debounces.
    pub debounce_ms: u64,
}

impl Default for Buttons {
    fn default() -> Self {
        Self {
            hold_threshold: 2000,
            hold_rate: 500,
            jog_steps: 1,
            debounce_ms: 10,
        }
    }
}

/// Step pulse shape for the GPIO backend.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct StepPulse {
    /// Direction-to-step setup interval in microseconds.
    pub setup_us: u64,
    /// Step-high hold in microseconds.
    pub pulse_us: u64,
}

impl Default for StepPulse {
    fn default() -> Self {
        // Equivalent wall-clock durations of the original fixed delay
        // counts at an 80 MHz reference clock.
        Self {
            setup_us: 13,
            pulse_us: 250,
        }
    }
}

/// Tick loop pacing.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Runner {
    /// Scheduler tick rate; speeds above are expressed in these ticks.
    pub tick_hz: u32,
}

impl Default for Runner {
    fn default() -> Self {
        Self { tick_hz: 1000 }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    /// Optional log file (JSON lines); console logging is always on.
    pub file: Option<String>,
    /// "error" | "warn" | "info" | "debug" | "trace"
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub motion: Motion,
    pub buttons: Buttons,
    pub step_pulse: StepPulse,
    pub runner: Runner,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Motion geometry
        if self.motion.range <= 0 {
            eyre::bail!("motion.range must be > 0");
        }
        if self.motion.closed < 0 {
            eyre::bail!("motion.closed must be >= 0");
        }
        if self.motion.closed > self.motion.open {
            eyre::bail!("motion.closed must be <= motion.open");
        }
        if self.motion.open > self.motion.range {
            eyre::bail!("motion.open must be <= motion.range");
        }

        // Speed profile
        if self.motion.speed_init == 0 || self.motion.speed_home == 0 || self.motion.speed_goto == 0
        {
            eyre::bail!("motion speeds must be > 0");
        }
        if self.motion.speed_goto > self.motion.speed_init {
            eyre::bail!("motion.speed_goto must be <= motion.speed_init");
        }
        if self.motion.accel == 0 {
            eyre::bail!("motion.accel must be > 0");
        }

        // Buttons
        if self.buttons.hold_threshold == 0 {
            eyre::bail!("buttons.hold_threshold must be >= 1");
        }
        if self.buttons.hold_rate == 0 {
            eyre::bail!("buttons.hold_rate must be >= 1");
        }
        if self.buttons.jog_steps <= 0 {
            eyre::bail!("buttons.jog_steps must be >= 1");
        }
        if self.buttons.debounce_ms == 0 {
            eyre::bail!("buttons.debounce_ms must be >= 1");
        }

        // Step pulse
        if self.step_pulse.pulse_us == 0 {
            eyre::bail!("step_pulse.pulse_us must be >= 1");
        }
        if self.step_pulse.setup_us > 10_000 || self.step_pulse.pulse_us > 10_000 {
            eyre::bail!("step_pulse timings are unreasonably large (>10ms)");
        }

        // Runner
        if self.runner.tick_hz == 0 {
            eyre::bail!("runner.tick_hz must be > 0");
        }

        Ok(())
    }
}
