//! System configuration parameters
//!
//! All tunable parameters for the potentiostat control core. These are the
//! design constants of the instrument; experiment-specific timing lives in
//! [`CompiledProgram`](crate::experiment::program::CompiledProgram).

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Output task ---
    /// Output (DAC) tick rate in Hz. Fixed cadence design constant.
    pub output_tick_hz: u32,

    // --- Sampling ---
    /// Minimum accepted `%SR:` sample rate (Hz).
    pub min_sample_rate_hz: u32,
    /// Maximum accepted `%SR:` sample rate (Hz).
    pub max_sample_rate_hz: u32,
    /// Lead window before `tSwitch` / `tCycle` in which the synchronized
    /// forward/reverse samples fire (microseconds).
    pub sync_lead_us: u64,

    // --- Output scaling ---
    /// DAC code written at boot, completion, stop, and fault (mid-scale, 0 V).
    pub dac_idle_code: u16,

    // --- Command link ---
    /// Frame receive deadline in milliseconds.
    pub frame_timeout_ms: u32,

    // --- Telemetry ---
    /// `true` = binary sample records, `false` = human-readable text records.
    pub binary_telemetry: bool,
}

impl SystemConfig {
    /// Output tick period in microseconds.
    pub fn output_period_us(&self) -> u64 {
        1_000_000 / u64::from(self.output_tick_hz)
    }

    /// Frame receive deadline in microseconds.
    pub fn frame_timeout_us(&self) -> u64 {
        u64::from(self.frame_timeout_ms) * 1_000
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // 500 Hz output tick: one DAC update every 2 ms.
            output_tick_hz: 500,

            // ADS1115 tops out at 860 SPS.
            min_sample_rate_hz: 1,
            max_sample_rate_hz: 860,
            sync_lead_us: 2_000,

            dac_idle_code: 32_768,

            frame_timeout_ms: 20_000,

            binary_telemetry: true,
        }
    }
}
