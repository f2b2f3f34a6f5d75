//! Port traits decoupling the control core from hardware.

use crate::error::Error;
use crate::telemetry::Report;

/// Cell-voltage output path (DAC behind the analog front end).
pub trait AnalogOutPort {
    /// Latch a 16-bit output code.
    fn write_code(&mut self, code: u16) -> Result<(), Error>;
}

/// Working-electrode current input path (differential ADC).
pub trait AnalogInPort {
    /// One differential conversion, raw signed code.
    fn read_differential(&mut self) -> Result<i16, Error>;
}

/// Transimpedance gain selection.
pub trait GainPort {
    /// Select a gain-range code (0..=7); returns the resulting feedback
    /// resistance in kilohms.
    fn select(&mut self, code: u8) -> Result<f32, Error>;
}

/// The two periodic tick timers.
pub trait TickTimerPort {
    /// Start the output tick at a fixed period (us).
    fn start_output(&mut self, period_us: u64) -> Result<(), Error>;
    /// Start the sample tick at the given period (us).
    fn start_sample(&mut self, period_us: u64) -> Result<(), Error>;
    /// Stop both timers. Idempotent.
    fn stop_all(&mut self);
}

/// Byte-oriented command/telemetry link.
pub trait SerialPort {
    /// One received byte, if any. Never blocks.
    fn poll_byte(&mut self) -> Option<u8>;
    /// Write the whole buffer.
    fn write_all(&mut self, bytes: &[u8]);
}

/// Monotonic microsecond clock.
pub trait MonotonicClock {
    fn now_us(&self) -> u64;
}

/// Outbound report channel. The serial sink is the production impl; tests
/// record the reports instead.
pub trait EventSink {
    fn emit(&mut self, report: &Report);
}
