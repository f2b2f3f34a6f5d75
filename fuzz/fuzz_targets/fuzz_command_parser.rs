//! Fuzz the serial frame parser: arbitrary bytes must never panic, and any
//! frame it accepts must survive request conversion and validation without
//! panicking either.

#![no_main]

use libfuzzer_sys::fuzz_target;
use potstat::command::parse_frame;
use potstat::config::SystemConfig;
use potstat::experiment::{program::CompiledProgram, validate};

fuzz_target!(|data: &[u8]| {
    let Ok(parsed) = parse_frame(data) else {
        return;
    };
    let Ok(request) = parsed.into_request() else {
        return;
    };
    let cfg = SystemConfig::default();
    if validate(&request, &cfg).is_ok() {
        let _ = CompiledProgram::build(&request);
    }
});
