//! Tick timers on ESP-IDF's esp_timer API.
//!
//! Two periodic timers: the output timer drives the waveform at a fixed
//! rate for the whole run, the sample timer runs at the per-experiment
//! rate and only for the sweep techniques. Callbacks execute in the ESP
//! timer task context (not ISR) and do nothing but raise the ready flags;
//! the consumer loop does all real work in thread context.

use esp_idf_svc::sys::*;

use crate::app::ports::TickTimerPort;
use crate::error::Error;
use crate::ticks;

static mut OUTPUT_TIMER: esp_timer_handle_t = core::ptr::null_mut();
static mut SAMPLE_TIMER: esp_timer_handle_t = core::ptr::null_mut();

unsafe extern "C" fn output_tick_cb(_arg: *mut core::ffi::c_void) {
    ticks::signal_output_tick();
}

unsafe extern "C" fn sample_tick_cb(_arg: *mut core::ffi::c_void) {
    ticks::signal_sample_tick();
}

/// Owns both timer handles. Created once at boot from the main task.
pub struct EspTickTimers {
    _private: (),
}

impl EspTickTimers {
    /// Create both timers, stopped.
    ///
    /// SAFETY invariants: called once from the single main task before any
    /// callback can fire; the handles are written here and only read
    /// afterwards.
    pub fn new() -> Result<Self, Error> {
        unsafe {
            let output_args = esp_timer_create_args_t {
                callback: Some(output_tick_cb),
                arg: core::ptr::null_mut(),
                dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                name: b"output\0".as_ptr() as *const _,
                skip_unhandled_events: true,
            };
            if esp_timer_create(&output_args, &raw mut OUTPUT_TIMER) != ESP_OK {
                return Err(Error::Hardware("output timer create"));
            }

            let sample_args = esp_timer_create_args_t {
                callback: Some(sample_tick_cb),
                arg: core::ptr::null_mut(),
                dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                name: b"sample\0".as_ptr() as *const _,
                skip_unhandled_events: true,
            };
            if esp_timer_create(&sample_args, &raw mut SAMPLE_TIMER) != ESP_OK {
                return Err(Error::Hardware("sample timer create"));
            }
        }
        Ok(Self { _private: () })
    }
}

impl TickTimerPort for EspTickTimers {
    fn start_output(&mut self, period_us: u64) -> Result<(), Error> {
        // SAFETY: handle written once in new(); esp_timer_start/stop are
        // safe to call from the main task at any time.
        unsafe {
            esp_timer_stop(OUTPUT_TIMER);
            if esp_timer_start_periodic(OUTPUT_TIMER, period_us) != ESP_OK {
                return Err(Error::Hardware("output timer start"));
            }
        }
        Ok(())
    }

    fn start_sample(&mut self, period_us: u64) -> Result<(), Error> {
        // SAFETY: as in start_output().
        unsafe {
            esp_timer_stop(SAMPLE_TIMER);
            if esp_timer_start_periodic(SAMPLE_TIMER, period_us) != ESP_OK {
                return Err(Error::Hardware("sample timer start"));
            }
        }
        Ok(())
    }

    fn stop_all(&mut self) {
        // SAFETY: stopping an already-stopped timer returns an error code
        // that is deliberately ignored.
        unsafe {
            esp_timer_stop(OUTPUT_TIMER);
            esp_timer_stop(SAMPLE_TIMER);
        }
    }
}
