//! Sampling scheduler.
//!
//! Two regimes, selected by `CompiledProgram::synchronized_sampling`:
//!
//! - **Periodic** (sweep techniques): the sample-tick timer fires at the
//!   requested rate, started only once deposition ends. The period is
//!   derived here; the timer itself lives behind
//!   [`TickTimerPort`](crate::app::ports::TickTimerPort).
//! - **Synchronized** (pulse techniques): exactly two samples per cycle,
//!   triggered from the output tick — a forward sample in a fixed lead
//!   window before `tSwitch` and a reverse sample in the same window
//!   before `tCycle`. [`SyncSampler`] holds the per-cycle once-only gates.

use crate::experiment::program::CompiledProgram;

/// Sample-tick period for a requested rate, rounded half-up to whole
/// microseconds.
pub fn sample_period_us(rate_hz: u32) -> u64 {
    let rate = u64::from(rate_hz.max(1));
    (1_000_000 + rate / 2) / rate
}

/// Which of the two per-cycle synchronized samples fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDirection {
    /// End of interval 1 (pulse top).
    Forward,
    /// End of the cycle (pulse base).
    Reverse,
}

/// Per-cycle gating for the synchronized regime.
///
/// Both done-flags are reset on entry into interval 1, so each direction
/// fires at most once per cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncSampler {
    fwd_done: bool,
    rev_done: bool,
}

impl SyncSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear both gates; call on every transition into interval 1.
    pub fn reset_cycle(&mut self) {
        self.fwd_done = false;
        self.rev_done = false;
    }

    /// Decide whether a synchronized sample is due at intra-cycle time
    /// `t_int_us`. Returns at most one direction per call; the forward
    /// window is checked first.
    pub fn poll(
        &mut self,
        prog: &CompiledProgram,
        sync_lead_us: u64,
        t_int_us: u64,
    ) -> Option<SampleDirection> {
        if !prog.synchronized_sampling {
            return None;
        }

        // Forward sample: lead window just before the interval switch.
        if !self.fwd_done
            && t_int_us < prog.t_switch_us
            && t_int_us >= prog.t_switch_us.saturating_sub(sync_lead_us)
        {
            self.fwd_done = true;
            return Some(SampleDirection::Forward);
        }

        // Reverse sample: lead window just before the cycle ends.
        if !self.rev_done && t_int_us >= prog.t_cycle_us.saturating_sub(sync_lead_us) {
            self.rev_done = true;
            return Some(SampleDirection::Reverse);
        }

        None
    }
}
