//! Experiment kinds, parameter limits, and the parameter validator.
//!
//! A received run command is parsed into a [`RawRequest`], validated here
//! against the per-experiment limits table, and only then compiled into a
//! [`program::CompiledProgram`]. Nothing downstream of validation ever sees
//! an out-of-range parameter.

pub mod program;

use crate::config::SystemConfig;
use crate::error::{Bound, ValidationError};
use heapless::Vec;

/// Maximum number of experiment parameters any kind accepts.
pub const MAX_PARAMS: usize = 10;

/// Ceiling on total experiment duration (70 minutes, in microseconds).
pub const MAX_EXPERIMENT_DURATION_US: u64 = 70 * 60 * 1_000_000;

/// Supported voltammetry techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentKind {
    /// Cyclic / linear-sweep voltammetry: ramping voltage, periodic sampling.
    CyclicOrLinearSweep,
    /// Differential-pulse voltammetry: stepped voltage, two synchronized
    /// samples per cycle.
    DifferentialPulse,
}

impl ExperimentKind {
    /// Map the `%E:` wire code to a kind.
    pub fn from_code(code: i64) -> Result<Self, ValidationError> {
        match code {
            1 => Ok(Self::CyclicOrLinearSweep),
            2 => Ok(Self::DifferentialPulse),
            other => Err(ValidationError::UnsupportedKind(other)),
        }
    }

    /// Number of parameters the kind requires.
    pub const fn required_count(self) -> usize {
        match self {
            Self::CyclicOrLinearSweep => 9,
            Self::DifferentialPulse => 10,
        }
    }

    const fn table_row(self) -> usize {
        match self {
            Self::CyclicOrLinearSweep => 0,
            Self::DifferentialPulse => 1,
        }
    }
}

/// A parsed, not-yet-validated run request. Transient: consumed by the
/// config builder or discarded on rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub kind: ExperimentKind,
    /// Raw `%SR:` value; range-checked during validation.
    pub sample_rate_hz: i64,
    /// Raw `%G:` value; range-checked during validation.
    pub gain: i64,
    /// Ordered parameter list, positional meaning per kind.
    pub params: Vec<i64, MAX_PARAMS>,
}

// ---------------------------------------------------------------------------
// Limits table
// ---------------------------------------------------------------------------

// Fields 0-3 (cleaning time/voltage, deposition time/voltage) share one
// range across both kinds; fields 4+ are kind-specific.
const LIMS_COND_T: (i64, i64) = (0, 600_000_000); // us, up to 10 min
const LIMS_COND_V: (i64, i64) = (-1_500, 1_500); // mV
const LIMS_MV: (i64, i64) = (-1_500, 1_500); // mV

/// `[kind][param index] -> (min, max)`. Row 0 = sweep, row 1 = pulse.
/// The sweep row's index 9 is unused (the kind takes 9 parameters).
const EXP_LIMITS: [[(i64, i64); MAX_PARAMS]; 2] = [
    [
        LIMS_COND_T, // P0 cleaning time (us)
        LIMS_COND_V, // P1 cleaning potential (mV)
        LIMS_COND_T, // P2 deposition time (us)
        LIMS_COND_V, // P3 deposition potential (mV)
        LIMS_MV,     // P4 start voltage (mV)
        LIMS_MV,     // P5 vertex 1 (mV)
        LIMS_MV,     // P6 vertex 2 (mV)
        (1, 50_000), // P7 slope (mV/s)
        (1, 100),    // P8 scans
        (0, 0),      // unused
    ],
    [
        LIMS_COND_T,  // P0 cleaning time (us)
        LIMS_COND_V,  // P1 cleaning potential (mV)
        LIMS_COND_T,  // P2 deposition time (us)
        LIMS_COND_V,  // P3 deposition potential (mV)
        LIMS_MV,      // P4 start voltage (mV)
        LIMS_MV,      // P5 stop voltage (mV)
        (-100, 100),  // P6 step (mV)
        (1, 500),     // P7 pulse amplitude (mV)
        (1, 2_000),   // P8 pulse width (ms)
        (2, 5_000),   // P9 pulse period (ms)
    ],
];

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Validate a raw request: parameter count, per-field limits, then the
/// kind-specific cross-field rule set. Reports the first violation.
pub fn validate(req: &RawRequest, cfg: &SystemConfig) -> Result<(), ValidationError> {
    let rate = req.sample_rate_hz;
    if rate < i64::from(cfg.min_sample_rate_hz) || rate > i64::from(cfg.max_sample_rate_hz) {
        return Err(ValidationError::SampleRateOutOfRange);
    }
    if !(0..=7).contains(&req.gain) {
        return Err(ValidationError::GainOutOfRange);
    }

    let expected = req.kind.required_count();
    if req.params.len() != expected {
        return Err(ValidationError::WrongParameterCount {
            expected,
            got: req.params.len(),
        });
    }

    let limits = &EXP_LIMITS[req.kind.table_row()];
    for (index, (&value, &(min, max))) in req.params.iter().zip(limits.iter()).enumerate() {
        if value < min {
            return Err(ValidationError::ParameterOutOfRange {
                index,
                bound: Bound::BelowMin,
            });
        }
        if value > max {
            return Err(ValidationError::ParameterOutOfRange {
                index,
                bound: Bound::AboveMax,
            });
        }
    }

    cross_checks(req.kind, &req.params)
}

/// Kind-specific cross-field consistency rules, applied after the per-field
/// pass. Each rule is a plain predicate over the raw parameter list so the
/// set stays independently testable.
fn cross_checks(kind: ExperimentKind, p: &[i64]) -> Result<(), ValidationError> {
    match kind {
        // The sweep technique has no cross-field constraints beyond the
        // per-field limits; degenerate geometry (vertex 1 == vertex 2) is
        // caught by the program builder's divide guards.
        ExperimentKind::CyclicOrLinearSweep => Ok(()),

        ExperimentKind::DifferentialPulse => {
            let (start, stop, step) = (p[4], p[5], p[6]);
            let (amplitude, width_ms, period_ms) = (p[7], p[8], p[9]);

            if step == 0 {
                return Err(ValidationError::ZeroStep);
            }
            if period_ms <= width_ms {
                return Err(ValidationError::PulseWidthExceedsPeriod);
            }
            // The staircase must walk from start towards stop: at least one
            // whole step in the direction of the step sign.
            let cycles = (start - stop) / step;
            if cycles < 1 {
                return Err(ValidationError::StaircaseDirection);
            }
            if stop + amplitude > 1_500 {
                return Err(ValidationError::AmplitudeCeiling);
            }
            let total_us = p[0] as u64 + p[2] as u64 + cycles as u64 * period_ms as u64 * 1_000;
            if total_us > MAX_EXPERIMENT_DURATION_US {
                return Err(ValidationError::DurationCeiling);
            }
            Ok(())
        }
    }
}
