//! Tick flags shared between timer callbacks and the consumer loop.
//!
//! The two hardware timers run in interrupt/dispatch context and must not
//! touch the runner directly. Each callback only sets its ready flag; the
//! consumer loop takes the flags and drives the runner from thread context.
//! Single producer per flag, single consumer, so a pair of atomics is all
//! the synchronization needed.

use core::sync::atomic::{AtomicBool, Ordering};

static OUTPUT_TICK: AtomicBool = AtomicBool::new(false);
static SAMPLE_TICK: AtomicBool = AtomicBool::new(false);

/// Mark the output tick ready. Callable from timer callback context.
pub fn signal_output_tick() {
    OUTPUT_TICK.store(true, Ordering::Release);
}

/// Mark the sample tick ready. Callable from timer callback context.
pub fn signal_sample_tick() {
    SAMPLE_TICK.store(true, Ordering::Release);
}

/// Consume the output tick flag. Returns true at most once per signal.
pub fn take_output_tick() -> bool {
    OUTPUT_TICK.swap(false, Ordering::Acquire)
}

/// Consume the sample tick flag. Returns true at most once per signal.
pub fn take_sample_tick() -> bool {
    SAMPLE_TICK.swap(false, Ordering::Acquire)
}

/// Clear both flags, discarding any pending ticks. The consumer loop calls
/// this once before it starts draining, so nothing raised during boot leaks
/// into the first experiment.
pub fn clear_all() {
    OUTPUT_TICK.store(false, Ordering::Release);
    SAMPLE_TICK.store(false, Ordering::Release);
}
