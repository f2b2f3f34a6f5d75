//! Mock hardware for integration tests.
//!
//! Records every DAC write, gain selection, and timer call so tests can
//! assert on the full command history without touching real peripherals.

use std::cell::Cell;
use std::collections::VecDeque;

use potstat::app::ports::{
    AnalogInPort, AnalogOutPort, EventSink, GainPort, MonotonicClock, SerialPort, TickTimerPort,
};
use potstat::drivers::gain;
use potstat::error::Error;
use potstat::telemetry::Report;

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub dac_codes: Vec<u16>,
    pub adc_value: i16,
    pub adc_fail: bool,
    pub gain_history: Vec<u8>,
    pub output_period_us: Option<u64>,
    pub sample_period_us: Option<u64>,
    pub output_running: bool,
    pub sample_running: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_dac(&self) -> Option<u16> {
        self.dac_codes.last().copied()
    }
}

impl AnalogOutPort for MockHardware {
    fn write_code(&mut self, code: u16) -> Result<(), Error> {
        self.dac_codes.push(code);
        Ok(())
    }
}

impl AnalogInPort for MockHardware {
    fn read_differential(&mut self) -> Result<i16, Error> {
        if self.adc_fail {
            return Err(Error::AdcRead);
        }
        Ok(self.adc_value)
    }
}

impl GainPort for MockHardware {
    fn select(&mut self, code: u8) -> Result<f32, Error> {
        self.gain_history.push(code);
        gain::effective_kohm(code).ok_or(Error::Hardware("gain code"))
    }
}

impl TickTimerPort for MockHardware {
    fn start_output(&mut self, period_us: u64) -> Result<(), Error> {
        self.output_period_us = Some(period_us);
        self.output_running = true;
        Ok(())
    }

    fn start_sample(&mut self, period_us: u64) -> Result<(), Error> {
        self.sample_period_us = Some(period_us);
        self.sample_running = true;
        Ok(())
    }

    fn stop_all(&mut self) {
        self.output_running = false;
        self.sample_running = false;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub reports: Vec<Report>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<(u16, i16, f32, f32)> {
        self.reports
            .iter()
            .filter_map(|r| match r {
                Report::Sample {
                    dac_code,
                    adc_raw,
                    volts,
                    microamps,
                } => Some((*dac_code, *adc_raw, *volts, *microamps)),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<&'static str> {
        self.reports
            .iter()
            .filter_map(|r| match r {
                Report::Info(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<Error> {
        self.reports
            .iter()
            .filter_map(|r| match r {
                Report::Error(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    pub fn scan_boundaries(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r, Report::ScanBoundary))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, report: &Report) {
        self.reports.push(*report);
    }
}

// ── ScriptedSerial ────────────────────────────────────────────

/// Feeds a canned receive script and records every transmitted byte.
#[derive(Default)]
pub struct ScriptedSerial {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
}

#[allow(dead_code)]
impl ScriptedSerial {
    pub fn with_input(bytes: &[u8]) -> Self {
        Self {
            rx: bytes.iter().copied().collect(),
            tx: Vec::new(),
        }
    }
}

impl SerialPort for ScriptedSerial {
    fn poll_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes);
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// A clock the test advances by hand. With a non-zero step it also
/// advances on every reading, so poll loops against an exhausted serial
/// script reach their deadline instead of spinning.
#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
    step: u64,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(step: u64) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }

    pub fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }
}

impl MonotonicClock for ManualClock {
    fn now_us(&self) -> u64 {
        let t = self.now.get();
        self.now.set(t + self.step);
        t
    }
}
