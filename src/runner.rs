//! Experiment runner: the state machine driving an active experiment.
//!
//! Life cycle:
//!
//! ```text
//! Idle ──start──▶ Running ──last cycle done──▶ Complete ──reset──▶ Idle
//!                    │
//!                    └──runtime fault──▶ Fault   (terminal)
//! ```
//!
//! The runner owns no hardware; every entry point borrows the ports it
//! needs, so the integration tests drive it with mocks. Tick entry points
//! are called from the consumer loop in thread context, never from the
//! timer callbacks themselves.

use crate::app::ports::{AnalogInPort, AnalogOutPort, EventSink, GainPort, TickTimerPort};
use crate::config::SystemConfig;
use crate::error::{Error, RuntimeFault};
use crate::experiment::program::CompiledProgram;
use crate::sampling::{sample_period_us, SyncSampler};
use crate::telemetry::Report;
use crate::waveform::{locate, output_voltage, scale_output, Interval};

/// ADC step size in millivolts (16-bit, ±1.024 V range).
const ADC_MV_PER_LSB: f32 = 0.03125;

/// Externally visible runner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerStatus {
    Idle,
    Running,
    Complete,
    Fault,
}

/// Book-keeping for the experiment currently executing.
struct ActiveExperiment {
    prog: CompiledProgram,
    /// Monotonic timestamp at which the experiment started (us).
    start_us: u64,
    prev_interval: Interval,
    sync: SyncSampler,
    sample_timer_on: bool,
    /// Feedback resistance of the selected gain range (kOhm).
    r_gain_kohm: f32,
    /// Last commanded DAC code / output voltage, echoed in sample records.
    last_dac: u16,
    last_volts: f32,
}

enum State {
    Idle,
    Running(ActiveExperiment),
    Complete,
    Fault(RuntimeFault),
}

pub struct ExperimentRunner {
    cfg: SystemConfig,
    state: State,
}

impl ExperimentRunner {
    pub fn new(cfg: SystemConfig) -> Self {
        Self {
            cfg,
            state: State::Idle,
        }
    }

    pub fn status(&self) -> RunnerStatus {
        match self.state {
            State::Idle => RunnerStatus::Idle,
            State::Running(_) => RunnerStatus::Running,
            State::Complete => RunnerStatus::Complete,
            State::Fault(_) => RunnerStatus::Fault,
        }
    }

    pub fn fault(&self) -> Option<RuntimeFault> {
        match self.state {
            State::Fault(f) => Some(f),
            _ => None,
        }
    }

    /// Begin executing a compiled program.
    ///
    /// Rejected while another experiment is running or finished-but-unread
    /// ([`Error::Busy`]), and permanently after a fault.
    pub fn start(
        &mut self,
        prog: CompiledProgram,
        now_us: u64,
        hw: &mut (impl GainPort + TickTimerPort),
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match self.state {
            State::Idle => {}
            State::Running(_) | State::Complete => return Err(Error::Busy),
            State::Fault(f) => return Err(Error::Fault(f)),
        }

        let r_gain_kohm = hw.select(prog.gain)?;
        hw.start_output(self.cfg.output_period_us())?;
        sink.emit(&Report::Info("Starting Experiment"));

        self.state = State::Running(ActiveExperiment {
            prog,
            start_us: now_us,
            prev_interval: Interval::NotStarted,
            sync: SyncSampler::new(),
            sample_timer_on: false,
            r_gain_kohm,
            last_dac: self.cfg.dac_idle_code,
            last_volts: 0.0,
        });
        Ok(())
    }

    /// Drive the output waveform for one tick.
    pub fn on_output_tick(
        &mut self,
        now_us: u64,
        hw: &mut (impl AnalogOutPort + AnalogInPort + TickTimerPort),
        sink: &mut impl EventSink,
    ) {
        let State::Running(ref mut active) = self.state else {
            return;
        };

        let t = now_us.saturating_sub(active.start_us);
        let pos = locate(&active.prog, t);

        if pos.interval == Interval::Done {
            self.finish(hw, sink);
            return;
        }

        // Interval transitions.
        if pos.interval != active.prev_interval {
            if (active.prev_interval, pos.interval)
                == (Interval::Interval2, Interval::Interval1)
            {
                sink.emit(&Report::ScanBoundary);
                active.sync.reset_cycle();
            }
            active.prev_interval = pos.interval;
        }

        // Deposition over: the periodic sample clock starts as soon as the
        // cycled portion is reached, so cleaning/deposition transients are
        // never sampled. The start offset can drop the first instant into
        // either half of the cycle.
        if matches!(pos.interval, Interval::Interval1 | Interval::Interval2)
            && !active.prog.synchronized_sampling
            && !active.sample_timer_on
        {
            match hw.start_sample(sample_period_us(active.prog.sample_rate_hz)) {
                Ok(()) => active.sample_timer_on = true,
                Err(e) => sink.emit(&Report::Error(e)),
            }
        }

        let v = output_voltage(&active.prog, &pos);
        let code = match scale_output(v) {
            Ok(code) => code,
            Err(fault) => {
                self.trip_fault(fault, hw, sink);
                return;
            }
        };
        if let Err(e) = hw.write_code(code) {
            // A transient bus error is reported but does not end the run.
            sink.emit(&Report::Error(e));
        }
        active.last_dac = code;
        active.last_volts = v;

        if active
            .sync
            .poll(&active.prog, self.cfg.sync_lead_us, pos.t_int_us)
            .is_some()
        {
            Self::capture_sample(active, hw, sink);
        }
    }

    /// Capture one sample on the periodic sample tick.
    pub fn on_sample_tick(&mut self, hw: &mut impl AnalogInPort, sink: &mut impl EventSink) {
        let State::Running(ref mut active) = self.state else {
            return;
        };
        if active.prog.synchronized_sampling {
            // Pulse techniques sample from the output tick only.
            return;
        }
        Self::capture_sample(active, hw, sink);
    }

    fn capture_sample(
        active: &mut ActiveExperiment,
        adc: &mut impl AnalogInPort,
        sink: &mut impl EventSink,
    ) {
        let raw = match adc.read_differential() {
            Ok(raw) => raw,
            Err(e) => {
                sink.emit(&Report::Error(e));
                return;
            }
        };
        let v_mv = f32::from(raw) * ADC_MV_PER_LSB;
        let microamps = v_mv / active.r_gain_kohm;
        sink.emit(&Report::Sample {
            dac_code: active.last_dac,
            adc_raw: raw,
            volts: active.last_volts,
            microamps,
        });
    }

    /// Operator stop ('x'). Drops the active experiment, if any.
    pub fn stop(
        &mut self,
        hw: &mut (impl AnalogOutPort + TickTimerPort),
        sink: &mut impl EventSink,
    ) {
        if matches!(self.state, State::Running(_)) {
            self.safe_outputs(hw);
            sink.emit(&Report::Info("Experiment Stopped"));
            self.state = State::Idle;
        }
    }

    /// Acknowledge a completed experiment, returning to [`RunnerStatus::Idle`].
    /// A fault is never cleared.
    pub fn reset(&mut self) {
        if matches!(self.state, State::Complete) {
            self.state = State::Idle;
        }
    }

    /// Force the runner into the terminal fault state.
    pub fn trip_fault(
        &mut self,
        fault: RuntimeFault,
        hw: &mut (impl AnalogOutPort + TickTimerPort),
        sink: &mut impl EventSink,
    ) {
        self.safe_outputs(hw);
        sink.emit(&Report::Error(Error::Fault(fault)));
        self.state = State::Fault(fault);
    }

    fn finish(
        &mut self,
        hw: &mut (impl AnalogOutPort + TickTimerPort),
        sink: &mut impl EventSink,
    ) {
        self.safe_outputs(hw);
        sink.emit(&Report::Info("Experiment Complete"));
        self.state = State::Complete;
    }

    /// Park the cell at mid-scale and silence both timers.
    fn safe_outputs(&mut self, hw: &mut (impl AnalogOutPort + TickTimerPort)) {
        // The idle code must land even if the bus is wedged; a failed
        // write here leaves nothing more to do.
        let _ = hw.write_code(self.cfg.dac_idle_code);
        hw.stop_all();
    }
}
