//! Raspberry Pi GPIO backend built on `rppal`.
//!
//! Pin conventions match the original controller board: the driver enable
//! line is active-low, the limit switch and both buttons are pull-up inputs
//! that read low when closed.

use crate::error::{HwError, Result};
use crossbeam_channel as xch;
pub use rppal::gpio::Gpio;
use rppal::gpio::{InputPin, OutputPin};
use shade_traits::{Direction, LimitSensor, StepDriver};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Step pulse shape. Defaults are the wall-clock equivalents of the original
/// fixed delay counts at an 80 MHz reference clock.
#[derive(Debug, Clone, Copy)]
pub struct StepPulseCfg {
    /// Direction-to-step setup interval in microseconds.
    pub setup_us: u64,
    /// Step-high hold in microseconds.
    pub pulse_us: u64,
}

impl Default for StepPulseCfg {
    fn default() -> Self {
        Self {
            setup_us: 13,
            pulse_us: 250,
        }
    }
}

/// Step/direction/enable driver on three output pins.
pub struct GpioStepDriver {
    enable: OutputPin,
    dir: OutputPin,
    step: OutputPin,
    pulse: StepPulseCfg,
}

impl GpioStepDriver {
    /// Claims the three pins and leaves the driver disabled.
    pub fn new(
        gpio: &Gpio,
        enable_pin: u8,
        dir_pin: u8,
        step_pin: u8,
        pulse: StepPulseCfg,
    ) -> Result<Self> {
        let mut enable = output(gpio, enable_pin)?;
        let dir = output(gpio, dir_pin)?;
        let mut step = output(gpio, step_pin)?;
        enable.set_high(); // active-low: start disabled
        step.set_low();
        Ok(Self {
            enable,
            dir,
            step,
            pulse,
        })
    }
}

impl StepDriver for GpioStepDriver {
    fn step(&mut self, dir: Direction) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match dir {
            Direction::Plus => self.dir.set_low(),
            Direction::Minus => self.dir.set_high(),
        }
        // Bounded blocking: setup then the pulse-high hold, both fixed.
        sleep_us(self.pulse.setup_us);
        self.step.set_high();
        sleep_us(self.pulse.pulse_us);
        self.step.set_low();
        Ok(())
    }

    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if enabled {
            self.enable.set_low();
        } else {
            self.enable.set_high();
        }
        Ok(())
    }
}

/// Active-low limit switch input with pull-up. Edge-interrupt clearing and
/// debouncing belong to the wiring/board layer, not here: the controller
/// only ever polls the level.
pub struct GpioLimitSensor {
    pin: InputPin,
}

impl GpioLimitSensor {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        Ok(Self {
            pin: input_pullup(gpio, pin)?,
        })
    }
}

impl LimitSensor for GpioLimitSensor {
    fn is_triggered(&mut self) -> bool {
        self.pin.is_low()
    }
}

/// Debounced poller for the two travel buttons.
///
/// Samples both pull-up inputs every `debounce` and emits the pressed-state
/// pair over a bounded channel whenever either level changes. The sampling
/// period is the debounce window; the gesture core never debounces.
pub struct ButtonPoller {
    rx: xch::Receiver<(bool, bool)>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl ButtonPoller {
    pub fn spawn(gpio: &Gpio, close_pin: u8, open_pin: u8, debounce: Duration) -> Result<Self> {
        let close = input_pullup(gpio, close_pin)?;
        let open = input_pullup(gpio, open_pin)?;
        let (tx, rx) = xch::bounded(8);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            let mut last = (close.is_low(), open.is_low());
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                let now = (close.is_low(), open.is_low());
                if now != last {
                    last = now;
                    if tx.send(now).is_err() {
                        tracing::debug!("button consumer disconnected, exiting poller");
                        break;
                    }
                }
                std::thread::sleep(debounce);
            }
            tracing::trace!("button poller exiting cleanly");
        });

        Ok(Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    pub fn events(&self) -> xch::Receiver<(bool, bool)> {
        self.rx.clone()
    }
}

impl Drop for ButtonPoller {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("button poller panicked during shutdown");
        }
    }
}

fn output(gpio: &Gpio, pin: u8) -> Result<OutputPin> {
    Ok(gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?
        .into_output())
}

fn input_pullup(gpio: &Gpio, pin: u8) -> Result<InputPin> {
    Ok(gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?
        .into_input_pullup())
}

fn sleep_us(us: u64) {
    if us > 0 {
        std::thread::sleep(Duration::from_micros(us));
    }
}
