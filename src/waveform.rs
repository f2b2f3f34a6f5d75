//! Waveform engine — pure functions from elapsed experiment time to the
//! current interval, cycle, and output voltage.
//!
//! The experiment timeline:
//!
//! ```text
//! 0 ──────────┬───────────┬──────────────────────────────────────┬──────
//!   Cleaning  │ Depositing│  cycle 0   cycle 1  …  cycle N-1     │ Done
//!             │           │ ┌────┬───┐┌────┬───┐                 │
//!             │           │ │ I1 │I2 ││ I1 │I2 │ …               │
//!             │           │ └────┴───┘└────┴───┘                 │
//! ```
//!
//! Within a cycle, interval 1 runs for `tSwitch` microseconds, interval 2
//! for the remainder of `tCycle`. `tOffset` phase-shifts the intra-cycle
//! clock so the first output voltage matches the requested start voltage.

use crate::error::RuntimeFault;
use crate::experiment::program::CompiledProgram;

/// A named phase of the experiment timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    NotStarted,
    Cleaning,
    Depositing,
    Interval1,
    Interval2,
    Done,
}

/// Where an elapsed time lands on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub interval: Interval,
    /// Cycle index; -1 while cleaning/depositing.
    pub cycle: i32,
    /// Time since the start of the current cycle, phase-shifted by
    /// `tOffset` (us). Zero outside the cycled region.
    pub t_int_us: u64,
}

/// Locate elapsed experiment time `t` (us since start) on the timeline.
pub fn locate(prog: &CompiledProgram, t: u64) -> Position {
    if t < prog.t_clean_us {
        return Position {
            interval: Interval::Cleaning,
            cycle: -1,
            t_int_us: 0,
        };
    }
    if t < prog.t_clean_us + prog.t_dep_us {
        return Position {
            interval: Interval::Depositing,
            cycle: -1,
            t_int_us: 0,
        };
    }

    // Active cycled region. tCycle > 0 is guaranteed by the builder guards.
    let rel = t - prog.t_clean_us - prog.t_dep_us;
    let cycle = (rel / prog.t_cycle_us) as i32;
    let t_int_us = (rel + prog.t_offset_us) % prog.t_cycle_us;

    let interval = if cycle >= prog.cycles {
        Interval::Done
    } else if t_int_us < prog.t_switch_us {
        Interval::Interval1
    } else {
        Interval::Interval2
    };

    Position {
        interval,
        cycle,
        t_int_us,
    }
}

/// Output voltage for a position on the timeline (V).
pub fn output_voltage(prog: &CompiledProgram, pos: &Position) -> f32 {
    let staircase = f64::from(pos.cycle) * f64::from(prog.offset_v);
    match pos.interval {
        Interval::Cleaning => prog.v_clean,
        Interval::Depositing => prog.v_dep,
        Interval::Interval1 => {
            let v = f64::from(prog.v_start[0])
                + f64::from(prog.v_slope[0]) * pos.t_int_us as f64
                + staircase;
            v as f32
        }
        Interval::Interval2 => {
            let v = f64::from(prog.v_start[1])
                + f64::from(prog.v_slope[1]) * (pos.t_int_us - prog.t_switch_us) as f64
                + staircase;
            v as f32
        }
        Interval::NotStarted | Interval::Done => 0.0,
    }
}

// ---------------------------------------------------------------------------
// DAC output scaling
// ---------------------------------------------------------------------------

/// Full-scale output range of the analog front end (V).
pub const V_FULL_SCALE: f32 = 1.5;

/// Scale a voltage in [-1.5, 1.5] V to a 16-bit DAC code, round half-up.
///
/// Values at or beyond the rails clamp to the end codes. A non-finite
/// voltage, or a computed code outside 0..=65535, is a [`RuntimeFault`]:
/// the build-time guards are supposed to make both impossible, so reaching
/// one here means an invariant was violated and the experiment must halt.
pub fn scale_output(v: f32) -> Result<u16, RuntimeFault> {
    if !v.is_finite() {
        return Err(RuntimeFault::NonFiniteOutput);
    }
    if v >= V_FULL_SCALE {
        return Ok(u16::MAX);
    }
    if v <= -V_FULL_SCALE {
        return Ok(0);
    }

    // 65535 / 3.0 V = 21845 codes per volt; work in thousandths for the
    // half-up rounding step.
    let milli = ((f64::from(v) + 1.5) * 21_845_000.0) as i64;
    let mut code = milli / 1000;
    if milli % 1000 >= 500 {
        code += 1;
    }
    if (0..=i64::from(u16::MAX)).contains(&code) {
        Ok(code as u16)
    } else {
        Err(RuntimeFault::DacCodeOutOfRange)
    }
}
