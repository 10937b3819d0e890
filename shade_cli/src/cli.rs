//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "shade", version, about = "Shade actuator controller")]
pub struct Cli {
    /// Path to config TOML; stock configuration when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Override the scheduler tick rate (useful to fast-forward simulation)
    #[arg(long, value_name = "HZ")]
    pub tick_hz: Option<u32>,

    /// Exit after this many ticks instead of running until ctrl-c
    #[arg(long, value_name = "TICKS")]
    pub max_ticks: Option<u64>,

    /// Drive the GPIO backend instead of the simulated rig
    /// (requires the `hardware` build feature)
    #[arg(long, action = ArgAction::SetTrue)]
    pub hardware: bool,

    /// Initial carriage position of the simulated rig, in steps
    #[arg(long, value_name = "STEPS", default_value_t = 8)]
    pub sim_start: i32,
}
