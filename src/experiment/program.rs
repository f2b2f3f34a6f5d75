//! Compiled experiment program and its derivation from raw parameters.
//!
//! [`CompiledProgram::build`] is a deterministic, side-effect-free mapping
//! from a validated [`RawRequest`](super::RawRequest) to the concrete
//! timing/voltage program the runner executes. All voltages arrive in mV
//! and are stored in volts; all times are stored in microseconds.

use super::{ExperimentKind, RawRequest};
use crate::error::ValidationError;

/// A fully derived timing/voltage program, ready for execution.
///
/// Exactly one program is live at a time: it is owned by the runner while
/// an experiment is active and dropped when it finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    /// Cleaning interval duration (us).
    pub t_clean_us: u64,
    /// Cleaning potential (V).
    pub v_clean: f32,
    /// Deposition interval duration (us).
    pub t_dep_us: u64,
    /// Deposition potential (V).
    pub v_dep: f32,
    /// Start voltage of each half-cycle interval (V).
    pub v_start: [f32; 2],
    /// Voltage slope of each half-cycle interval (V/us).
    pub v_slope: [f32; 2],
    /// Time within a cycle at which interval 1 ends and interval 2 begins (us).
    pub t_switch_us: u64,
    /// Phase shift applied to elapsed time before interval/cycle computation (us).
    pub t_offset_us: u64,
    /// Total cycle duration (us).
    pub t_cycle_us: u64,
    /// Per-cycle voltage staircase increment (V).
    pub offset_v: f32,
    /// Total cycle count.
    pub cycles: i32,
    /// ADC sampling rate for the periodic regime (Hz).
    pub sample_rate_hz: u32,
    /// `false`: timer-driven periodic sampling (sweep techniques).
    /// `true`: two samples per cycle from the output tick (pulse techniques).
    pub synchronized_sampling: bool,
    /// Transimpedance gain-range code (0..=7).
    pub gain: u8,
}

impl CompiledProgram {
    /// Derive a program from a validated request.
    ///
    /// The divide guards here back up the validator: a zero sweep slope,
    /// coincident vertices, a zero pulse step, or a zero pulse period would
    /// otherwise propagate NaN/infinity into the timing state machine.
    pub fn build(req: &RawRequest) -> Result<Self, ValidationError> {
        let p = &req.params;
        match req.kind {
            ExperimentKind::CyclicOrLinearSweep => {
                // P0..P8 = clean-time, clean-mV, dep-time, dep-mV,
                //          start-mV, vertex1-mV, vertex2-mV, slope-mV/s, scans
                let slope_mv_s = p[7];
                if slope_mv_s == 0 {
                    return Err(ValidationError::ZeroSlope);
                }
                if p[6] == p[5] {
                    // tSwitch would be zero: a cycle with no extent.
                    return Err(ValidationError::DegenerateVertices);
                }

                let v_start = [p[5] as f32 / 1000.0, p[6] as f32 / 1000.0];
                // mV/s -> V/us, signed by sweep direction.
                let slope_mag = slope_mv_s as f32 * 1e-9;
                let slope0 = if v_start[1] > v_start[0] {
                    slope_mag
                } else {
                    -slope_mag
                };

                // Phase shift from the nominal start voltage to vertex 1.
                // vStart[0] deliberately binds to vertex 1, with tOffset
                // compensating the gap between start and vertex 1.
                let slope_abs = slope_mv_s.unsigned_abs();
                let t_offset_us = (p[5] - p[4]).unsigned_abs() * 1_000_000 / slope_abs;
                let t_switch_us = (p[6] - p[5]).unsigned_abs() * 1_000_000 / slope_abs;

                Ok(Self {
                    t_clean_us: p[0] as u64,
                    v_clean: p[1] as f32 / 1000.0,
                    t_dep_us: p[2] as u64,
                    v_dep: p[3] as f32 / 1000.0,
                    v_start,
                    v_slope: [slope0, -slope0],
                    t_switch_us,
                    t_offset_us,
                    t_cycle_us: 2 * t_switch_us,
                    offset_v: 0.0,
                    cycles: p[8] as i32,
                    sample_rate_hz: req.sample_rate_hz as u32,
                    synchronized_sampling: false,
                    gain: req.gain as u8,
                })
            }

            ExperimentKind::DifferentialPulse => {
                // P0..P9 = clean-time, clean-mV, dep-time, dep-mV, start-mV,
                //          stop-mV, step-mV, amplitude-mV, width-ms, period-ms
                let step_mv = p[6];
                if step_mv == 0 {
                    return Err(ValidationError::ZeroStep);
                }
                let period_ms = p[9];
                if period_ms == 0 {
                    return Err(ValidationError::ZeroPulsePeriod);
                }
                if period_ms <= p[8] {
                    return Err(ValidationError::PulseWidthExceedsPeriod);
                }
                let cycles = ((p[4] - p[5]) / step_mv) as i32;
                if cycles < 0 {
                    return Err(ValidationError::StaircaseDirection);
                }

                let v_base = p[4] as f32 / 1000.0;
                Ok(Self {
                    t_clean_us: p[0] as u64,
                    v_clean: p[1] as f32 / 1000.0,
                    t_dep_us: p[2] as u64,
                    v_dep: p[3] as f32 / 1000.0,
                    v_start: [v_base, p[7] as f32 / 1000.0 - v_base],
                    v_slope: [0.0, 0.0],
                    t_switch_us: ((period_ms - p[8]) * 1_000) as u64,
                    t_offset_us: 0,
                    t_cycle_us: (period_ms * 1_000) as u64,
                    offset_v: step_mv as f32 / 1000.0,
                    cycles,
                    sample_rate_hz: req.sample_rate_hz as u32,
                    synchronized_sampling: true,
                    gain: req.gain as u8,
                })
            }
        }
    }

    /// Total scheduled duration of the experiment in microseconds.
    pub fn total_duration_us(&self) -> u64 {
        self.t_clean_us + self.t_dep_us + self.t_cycle_us * self.cycles.max(0) as u64
    }
}
