//! Potentiostat firmware — main entry point.
//!
//! Boot sequence: ESP-IDF bootstrap, peripheral construction, analog front
//! end parked at mid-scale, then the consumer loop. The loop drains the two
//! tick flags into the runner and services the serial command link:
//!
//! - `!` — handshake; answered with `C`, then one run frame is read.
//! - `x` — stop the active experiment.
//!
//! A runtime fault halts the loop permanently; only a board reset clears it.

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, OutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};

use potstat::adapters::hardware::HardwareAdapter;
use potstat::adapters::serial::UartSerial;
use potstat::adapters::time::Uptime;
use potstat::app::ports::{EventSink, MonotonicClock, SerialPort};
use potstat::command;
use potstat::config::SystemConfig;
use potstat::error::Error;
use potstat::experiment::{self, program::CompiledProgram};
use potstat::runner::{ExperimentRunner, RunnerStatus};
use potstat::telemetry::{Report, SerialReportSink};
use potstat::ticks;

/// Gain range selected at boot, before any command arrives (10 kOhm).
const BOOT_GAIN: u8 = 2;

fn main() -> Result<()> {
    // ── ESP-IDF bootstrap ─────────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("potstat v{}", env!("CARGO_PKG_VERSION"));

    let cfg = SystemConfig::default();
    let p = Peripherals::take()?;

    // ── Peripheral construction ───────────────────────────────
    let i2c = I2cDriver::new(
        p.i2c0,
        p.pins.gpio8, // SDA
        p.pins.gpio9, // SCL
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    let mux_a = PinDriver::output(p.pins.gpio4.downgrade_output())?;
    let mux_b = PinDriver::output(p.pins.gpio5.downgrade_output())?;
    let boost = PinDriver::output(p.pins.gpio6.downgrade_output())?;

    let uart = UartDriver::new(
        p.uart1,
        p.pins.gpio17, // TX
        p.pins.gpio18, // RX
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(115_200)),
    )?;

    let mut hw = HardwareAdapter::new(i2c, mux_a, mux_b, boost, cfg.dac_idle_code, BOOT_GAIN)?;
    let mut sink = SerialReportSink::new(UartSerial::new(uart), cfg.binary_telemetry);
    let clock = Uptime::new();
    let mut runner = ExperimentRunner::new(cfg.clone());

    info!("analog front end parked, entering consumer loop");

    // ── Consumer loop ─────────────────────────────────────────
    ticks::clear_all();
    loop {
        if ticks::take_output_tick() {
            runner.on_output_tick(clock.now_us(), &mut hw, &mut sink);
        }
        if ticks::take_sample_tick() {
            runner.on_sample_tick(&mut hw, &mut sink);
        }

        if let Some(fault) = runner.fault() {
            halt(fault.class());
        }

        // A finished experiment frees the instrument for the next command.
        if runner.status() == RunnerStatus::Complete {
            runner.reset();
        }

        match sink.serial_mut().poll_byte() {
            Some(b'!') => {
                sink.serial_mut().write_all(b"C");
                if let Err(e) = handle_run_command(&cfg, &clock, &mut runner, &mut hw, &mut sink) {
                    warn!("command rejected: {e}");
                    sink.emit(&Report::Error(e));
                }
            }
            Some(b'x') => runner.stop(&mut hw, &mut sink),
            _ => {}
        }

        FreeRtos::delay_ms(1);
    }
}

/// Read, parse, validate, compile, and start one run command.
fn handle_run_command(
    cfg: &SystemConfig,
    clock: &impl MonotonicClock,
    runner: &mut ExperimentRunner,
    hw: &mut HardwareAdapter,
    sink: &mut SerialReportSink<UartSerial>,
) -> Result<(), Error> {
    let frame = command::read_frame(sink.serial_mut(), clock, cfg.frame_timeout_us())?;
    let request = command::parse_frame(&frame)?.into_request()?;
    experiment::validate(&request, cfg)?;
    let prog = CompiledProgram::build(&request)?;
    runner.start(prog, clock.now_us(), hw, sink)
}

/// Non-recoverable halt: park here signalling the fault class until the
/// board is reset.
fn halt(class: u8) -> ! {
    loop {
        error!("halted with fault class {class}");
        FreeRtos::delay_ms(1_000);
    }
}
