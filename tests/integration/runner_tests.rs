//! End-to-end runs: serial frame in, telemetry out, against mock hardware.

use crate::mock_hw::{ManualClock, MockHardware, RecordingSink, ScriptedSerial};
use potstat::app::ports::EventSink;
use potstat::command::{self, ParsedFrame};
use potstat::config::SystemConfig;
use potstat::error::{Error, ParseError, RuntimeFault, ValidationError};
use potstat::experiment::{self, program::CompiledProgram, RawRequest};
use potstat::runner::{ExperimentRunner, RunnerStatus};
use potstat::telemetry::{Report, SerialReportSink};

/// Output tick period matching `SystemConfig::default()` (500 Hz).
const TICK_US: u64 = 2_000;

fn compile(frame: &[u8]) -> CompiledProgram {
    let request = request(frame);
    let cfg = SystemConfig::default();
    experiment::validate(&request, &cfg).expect("frame must validate");
    CompiledProgram::build(&request).expect("frame must compile")
}

fn request(frame: &[u8]) -> RawRequest {
    command::parse_frame(frame)
        .expect("frame must parse")
        .into_request()
        .expect("kind must resolve")
}

/// Step the output tick until the runner leaves `Running` (or the cap hits).
fn run_output_ticks(
    runner: &mut ExperimentRunner,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
) -> u64 {
    let mut t = 0;
    while runner.status() == RunnerStatus::Running {
        runner.on_output_tick(t, hw, sink);
        t += TICK_US;
        assert!(t < 600_000_000, "run never completed");
    }
    t
}

#[test]
fn sweep_frame_runs_to_completion() {
    // 100 mV vertex at 50 V/s: tSwitch = 2 ms, tCycle = 4 ms, one scan.
    let prog = compile(b"<R%SR:860%G:4%E:1%EP:0,0,0,0,0,0,100,50000,1,%/>");
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    let mut runner = ExperimentRunner::new(SystemConfig::default());

    runner.start(prog, 0, &mut hw, &mut sink).unwrap();
    assert_eq!(hw.output_period_us, Some(TICK_US));
    assert_eq!(hw.gain_history, vec![4]);

    run_output_ticks(&mut runner, &mut hw, &mut sink);

    assert_eq!(runner.status(), RunnerStatus::Complete);
    // t=0 start voltage, t=2ms vertex (100 mV), then parked at mid-scale.
    assert_eq!(hw.dac_codes, vec![32_768, 34_952, 32_768]);
    // Periodic clock programmed for 860 Hz once deposition (zero here) ended.
    assert_eq!(hw.sample_period_us, Some(1_163));
    assert!(!hw.output_running && !hw.sample_running);
    assert_eq!(sink.infos(), vec!["Starting Experiment", "Experiment Complete"]);
}

#[test]
fn periodic_sample_reports_current_through_selected_gain() {
    let prog = compile(b"<R%SR:10%G:2%E:1%EP:0,0,0,0,0,0,400,100,1,%/>");
    let mut hw = MockHardware::new();
    hw.adc_value = 3_200; // 100 mV
    let mut sink = RecordingSink::new();
    let mut runner = ExperimentRunner::new(SystemConfig::default());

    runner.start(prog, 0, &mut hw, &mut sink).unwrap();
    runner.on_output_tick(0, &mut hw, &mut sink);
    runner.on_sample_tick(&mut hw, &mut sink);

    let samples = sink.samples();
    assert_eq!(samples.len(), 1);
    let (dac, raw, _volts, microamps) = samples[0];
    assert_eq!(dac, 32_768);
    assert_eq!(raw, 3_200);
    // Gain code 2 selects 10 kOhm: 100 mV / 10 kOhm = 10 uA.
    assert!((microamps - 10.0).abs() < 1e-4);
}

#[test]
fn pulse_frame_samples_twice_per_cycle_with_lead_windows() {
    // 5 staircase steps of 100 ms; pulse top ends at 60 ms into the cycle.
    let prog = compile(b"<R%SR:60%G:2%E:2%EP:0,0,0,0,200,180,4,50,40,100,%/>");
    assert_eq!(prog.cycles, 5);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    let mut runner = ExperimentRunner::new(SystemConfig::default());

    runner.start(prog, 0, &mut hw, &mut sink).unwrap();
    run_output_ticks(&mut runner, &mut hw, &mut sink);

    assert_eq!(runner.status(), RunnerStatus::Complete);
    // Two synchronized samples per staircase step, no periodic clock.
    let samples = sink.samples();
    assert_eq!(samples.len(), 10);
    assert_eq!(hw.sample_period_us, None);
    // A scan marker at each cycle wrap (the final wrap is completion).
    assert_eq!(sink.scan_boundaries(), 4);
    // First cycle: forward sample on the pulse top, reverse on the base.
    assert!((samples[0].2 - 0.2).abs() < 1e-6);
    assert!((samples[1].2 - -0.15).abs() < 1e-6);
}

#[test]
fn offset_sweep_entering_reverse_half_still_starts_sample_clock() {
    // Start 0 mV between vertices 500 and 200 at 50 V/s: tSwitch = 6 ms,
    // tCycle = 12 ms, tOffset = 10 ms, so the first tick lands in the
    // reverse half of the cycle. The periodic clock must start there too,
    // not wait for a forward half.
    let prog = compile(b"<R%SR:860%G:2%E:1%EP:0,0,0,0,0,500,200,50000,1,%/>");
    assert_eq!(prog.t_switch_us, 6_000);
    assert_eq!(prog.t_offset_us, 10_000);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    let mut runner = ExperimentRunner::new(SystemConfig::default());

    runner.start(prog, 0, &mut hw, &mut sink).unwrap();
    runner.on_output_tick(0, &mut hw, &mut sink);

    assert_eq!(hw.sample_period_us, Some(1_163));
    assert!(hw.sample_running);

    run_output_ticks(&mut runner, &mut hw, &mut sink);
    assert_eq!(runner.status(), RunnerStatus::Complete);
}

#[test]
fn second_start_rejected_while_running() {
    let prog = compile(b"<R%SR:10%G:2%E:1%EP:0,0,0,0,0,0,400,100,1,%/>");
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    let mut runner = ExperimentRunner::new(SystemConfig::default());

    runner.start(prog.clone(), 0, &mut hw, &mut sink).unwrap();
    let err = runner.start(prog, 0, &mut hw, &mut sink).unwrap_err();
    assert!(matches!(err, Error::Busy));
    assert_eq!(runner.status(), RunnerStatus::Running);
}

#[test]
fn non_finite_program_faults_and_halts() {
    let mut prog = compile(b"<R%SR:10%G:2%E:1%EP:0,0,0,0,0,0,400,100,1,%/>");
    prog.v_start[0] = f32::NAN;
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    let mut runner = ExperimentRunner::new(cfg.clone());

    runner.start(prog, 0, &mut hw, &mut sink).unwrap();
    runner.on_output_tick(0, &mut hw, &mut sink);

    assert_eq!(runner.status(), RunnerStatus::Fault);
    assert_eq!(runner.fault(), Some(RuntimeFault::NonFiniteOutput));
    assert_eq!(hw.last_dac(), Some(cfg.dac_idle_code));
    assert!(!hw.output_running && !hw.sample_running);
    assert_eq!(
        sink.errors(),
        vec![Error::Fault(RuntimeFault::NonFiniteOutput)]
    );

    // Ticks after the fault do nothing.
    let writes = hw.dac_codes.len();
    runner.on_output_tick(TICK_US, &mut hw, &mut sink);
    assert_eq!(hw.dac_codes.len(), writes);
}

#[test]
fn half_frame_times_out() {
    let mut serial = ScriptedSerial::with_input(b"<R%SR:60%G:");
    let clock = ManualClock::with_step(1_000_000);
    let err = command::read_frame(&mut serial, &clock, 20_000_000).unwrap_err();
    assert_eq!(err, ParseError::FrameTimeout);
}

#[test]
fn degenerate_sweep_rejected_on_the_wire() {
    // Equal vertices clear validation but fail program compilation; the
    // rejection goes out as a text error line.
    let request = request(b"<R%SR:60%G:2%E:1%EP:0,0,0,0,-200,800,800,100,3,%/>");
    let cfg = SystemConfig::default();
    assert_eq!(experiment::validate(&request, &cfg), Ok(()));
    let err = CompiledProgram::build(&request).unwrap_err();
    assert_eq!(err, ValidationError::DegenerateVertices);

    let mut sink = SerialReportSink::new(ScriptedSerial::default(), true);
    sink.emit(&Report::Error(err.into()));
    assert_eq!(
        sink.serial_mut().tx,
        b"Error: validation: vertex 1 and vertex 2 must differ\n"
    );
}

#[test]
fn binary_sample_record_on_the_wire() {
    let mut sink = SerialReportSink::new(ScriptedSerial::default(), true);
    sink.emit(&Report::Sample {
        dac_code: 0x8000,
        adc_raw: -1,
        volts: 0.0,
        microamps: 0.0,
    });
    assert_eq!(
        sink.serial_mut().tx,
        vec![b'B', 13, 0x00, 0x80, 0xFF, 0xFF, 0xFF, 0xFF, 13]
    );
}

#[test]
fn text_sample_record_on_the_wire() {
    let mut sink = SerialReportSink::new(ScriptedSerial::default(), false);
    sink.emit(&Report::Sample {
        dac_code: 34_952,
        adc_raw: 3_200,
        volts: 0.1,
        microamps: 10.0,
    });
    assert_eq!(sink.serial_mut().tx, b"34952,0.10,10.00\n");
}

#[test]
fn stop_mid_run_then_restart() {
    let prog = compile(b"<R%SR:10%G:2%E:1%EP:0,0,0,0,0,0,400,100,1,%/>");
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    let cfg = SystemConfig::default();
    let mut runner = ExperimentRunner::new(cfg.clone());

    runner.start(prog.clone(), 0, &mut hw, &mut sink).unwrap();
    runner.on_output_tick(0, &mut hw, &mut sink);
    runner.stop(&mut hw, &mut sink);

    assert_eq!(runner.status(), RunnerStatus::Idle);
    assert_eq!(hw.last_dac(), Some(cfg.dac_idle_code));
    assert!(runner.start(prog, 0, &mut hw, &mut sink).is_ok());
}

#[test]
fn frame_lexes_before_request_conversion() {
    let parsed: ParsedFrame =
        command::parse_frame(b"<R%SR:60%G:2%E:9%EP:1,2,3,%/>").unwrap();
    assert_eq!(parsed.kind_code, 9);
    assert_eq!(
        parsed.into_request(),
        Err(ValidationError::UnsupportedKind(9))
    );
}
