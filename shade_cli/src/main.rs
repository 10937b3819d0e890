mod cli;

use clap::Parser;
use cli::{Cli, FILE_GUARD};
use crossbeam_channel::{Receiver, bounded};
use eyre::{Result, WrapErr};
use shade_config::Config;
use shade_core::{
    ButtonCfg, ButtonGesture, CommandInterpreter, MotionCfg, MotionController, RunnerOpts,
    TargetHandle, runner,
};
use shade_traits::{LimitSensor, MonotonicClock, StepDriver};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let cfg = load_config(&args)?;
    cfg.validate().wrap_err("config validation")?;
    init_tracing(&args, &cfg.logging)?;

    let opts = RunnerOpts {
        tick_hz: args.tick_hz.unwrap_or(cfg.runner.tick_hz),
        max_ticks: args.max_ticks,
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .wrap_err("install ctrl-c handler")?;
    }

    let chars = spawn_stdin_reader();

    if args.hardware {
        run_gpio(&args, &cfg, opts, &stop, &chars)
    } else {
        run_sim(&args, &cfg, opts, &stop, &chars)
    }
}

fn load_config(args: &Cli) -> Result<Config> {
    match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("read config {}", path.display()))?;
            shade_config::load_toml(&text)
                .wrap_err_with(|| format!("parse config {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn init_tracing(args: &Cli, logging: &shade_config::Logging) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = logging.level.as_deref().unwrap_or(&args.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(file) = &logging.file {
        let path = std::path::Path::new(file);
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let name = path.file_name().unwrap_or_else(|| "shade.log".as_ref());
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(writer)
            .init();
    } else if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

/// Forward the leading character of each stdin line into the command
/// channel. Line assembly is the transport's job; the interpreter only ever
/// sees single characters.
fn spawn_stdin_reader() -> Receiver<char> {
    let (tx, rx) = bounded(64);
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if let Some(ch) = line.chars().next()
                && tx.send(ch).is_err()
            {
                break;
            }
        }
        tracing::debug!("stdin closed");
    });
    rx
}

fn run_sim(
    args: &Cli,
    cfg: &Config,
    opts: RunnerOpts,
    stop: &Arc<AtomicBool>,
    chars: &Receiver<char>,
) -> Result<()> {
    let rig = shade_hardware::SimulatedRig::new(args.sim_start, 0);
    tracing::info!(start = args.sim_start, "simulated rig");
    // No button source in simulation; the channel just stays empty.
    let (_btn_tx, btn_rx) = bounded::<(bool, bool)>(8);
    drive(rig.driver(), rig.limit(), cfg, opts, stop, chars, &btn_rx)
}

#[cfg(feature = "hardware")]
fn run_gpio(
    _args: &Cli,
    cfg: &Config,
    opts: RunnerOpts,
    stop: &Arc<AtomicBool>,
    chars: &Receiver<char>,
) -> Result<()> {
    use shade_hardware::gpio::{ButtonPoller, Gpio, GpioLimitSensor, GpioStepDriver, StepPulseCfg};
    use std::time::Duration;

    let gpio = Gpio::new().wrap_err("open gpio")?;
    let pulse = StepPulseCfg {
        setup_us: cfg.step_pulse.setup_us,
        pulse_us: cfg.step_pulse.pulse_us,
    };
    let driver = GpioStepDriver::new(&gpio, cfg.pins.enable, cfg.pins.dir, cfg.pins.step, pulse)
        .wrap_err("step driver pins")?;
    let limit = GpioLimitSensor::new(&gpio, cfg.pins.limit).wrap_err("limit pin")?;
    let poller = ButtonPoller::spawn(
        &gpio,
        cfg.pins.button_close,
        cfg.pins.button_open,
        Duration::from_millis(cfg.buttons.debounce_ms),
    )
    .wrap_err("button pins")?;
    let btn_rx = poller.events();
    drive(driver, limit, cfg, opts, stop, chars, &btn_rx)
}

#[cfg(not(feature = "hardware"))]
fn run_gpio(
    _args: &Cli,
    _cfg: &Config,
    _opts: RunnerOpts,
    _stop: &Arc<AtomicBool>,
    _chars: &Receiver<char>,
) -> Result<()> {
    eyre::bail!("built without the `hardware` feature; rebuild with --features hardware")
}

fn drive<D, L>(
    driver: D,
    limit: L,
    cfg: &Config,
    opts: RunnerOpts,
    stop: &Arc<AtomicBool>,
    chars: &Receiver<char>,
    buttons: &Receiver<(bool, bool)>,
) -> Result<()>
where
    D: StepDriver,
    L: LimitSensor,
{
    let motion_cfg = MotionCfg::from(&cfg.motion);
    let target = TargetHandle::new(0);
    let mut motion = MotionController::new(driver, limit, motion_cfg, target.clone())
        .wrap_err("build motion controller")?;
    let mut gesture = ButtonGesture::new(
        ButtonCfg::from(&cfg.buttons),
        &motion_cfg,
        target.clone(),
    );
    let commands = CommandInterpreter::new(motion_cfg.range, target);

    let clock = MonotonicClock::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = runner::run(
        &mut motion,
        &mut gesture,
        &commands,
        chars,
        buttons,
        &clock,
        stop,
        &mut out,
        opts,
    );

    if let Err(e) = motion.disable_driver() {
        tracing::warn!(error = %e, "driver disable on shutdown failed");
    }
    result.map(|_| ())
}
