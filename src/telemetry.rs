//! Telemetry wire formats and the serial report sink.
//!
//! The core emits structured [`Report`]s through the
//! [`EventSink`](crate::app::ports::EventSink) port; this module turns them
//! into bytes. Two selectable sample encodings:
//!
//! - **Binary** (default): marker byte `B`, CR, little-endian 16-bit DAC
//!   code, little-endian 16-bit ADC code sign-extended to 32 bits via two
//!   fill bytes (`0x00` non-negative, `0xFF` negative), CR. The host side
//!   expects a signed 32-bit slot, hence the fill bytes.
//! - **Text** (debug): `"<dacCode>,<outputVolts>,<currentMicroamps>\n"`.
//!
//! Informational and error lines are `"Info: …"` / `"Error: …"`; a single
//! `S` line marks each completed scan boundary.

use core::fmt::Write as _;

use crate::app::ports::{EventSink, SerialPort};
use crate::error::Error;
use heapless::String;

/// Structured reports emitted by the runner and consumer loop.
#[derive(Debug, Clone, Copy)]
pub enum Report {
    /// One captured sample with the DAC/ADC codes and engineering units.
    Sample {
        dac_code: u16,
        adc_raw: i16,
        volts: f32,
        microamps: f32,
    },
    /// Interval2 -> Interval1 transition: one scan completed.
    ScanBoundary,
    /// Informational message for the operator.
    Info(&'static str),
    /// A rejected command or run-time problem.
    Error(Error),
}

/// Length of one binary sample record.
pub const BINARY_RECORD_LEN: usize = 9;

/// Scan-boundary marker line.
pub const SCAN_MARKER: &[u8] = b"S\n";

/// Encode a sample as the 9-byte binary record.
pub fn encode_binary_sample(dac_code: u16, adc_raw: i16) -> [u8; BINARY_RECORD_LEN] {
    let fill = if adc_raw < 0 { 0xFF } else { 0x00 };
    let dac = dac_code.to_le_bytes();
    let adc = adc_raw.to_le_bytes();
    [
        b'B', 13, dac[0], dac[1], adc[0], adc[1], fill, fill, 13,
    ]
}

/// Format a sample as a text record: `"<dac>,<volts>,<microamps>\n"`.
pub fn format_text_sample(dac_code: u16, volts: f32, microamps: f32) -> String<48> {
    let mut s = String::new();
    // Capacity is sized for the widest possible record; write! cannot fail.
    let _ = write!(s, "{dac_code},{volts:.2},{microamps:.2}\n");
    s
}

/// Format an `"Info: …"` line.
pub fn format_info(msg: &str) -> String<96> {
    let mut s = String::new();
    let _ = write!(s, "Info: {msg}\n");
    s
}

/// Format an `"Error: …"` line.
pub fn format_error(err: &Error) -> String<96> {
    let mut s = String::new();
    let _ = write!(s, "Error: {err}\n");
    s
}

// ---------------------------------------------------------------------------
// Serial sink
// ---------------------------------------------------------------------------

/// [`EventSink`] that writes reports to the serial link in the configured
/// sample encoding.
pub struct SerialReportSink<S> {
    serial: S,
    binary: bool,
}

impl<S: SerialPort> SerialReportSink<S> {
    pub fn new(serial: S, binary: bool) -> Self {
        Self { serial, binary }
    }

    /// Access the underlying serial port (for the command reader).
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }
}

impl<S: SerialPort> EventSink for SerialReportSink<S> {
    fn emit(&mut self, report: &Report) {
        match *report {
            Report::Sample {
                dac_code,
                adc_raw,
                volts,
                microamps,
            } => {
                if self.binary {
                    self.serial
                        .write_all(&encode_binary_sample(dac_code, adc_raw));
                } else {
                    self.serial
                        .write_all(format_text_sample(dac_code, volts, microamps).as_bytes());
                }
            }
            Report::ScanBoundary => self.serial.write_all(SCAN_MARKER),
            Report::Info(msg) => self.serial.write_all(format_info(msg).as_bytes()),
            Report::Error(err) => self.serial.write_all(format_error(&err).as_bytes()),
        }
    }
}
