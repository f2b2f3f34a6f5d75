//! Transimpedance gain ranges.
//!
//! Eight gain codes map onto four switchable feedback resistors; odd codes
//! additionally engage the 4x measurement amplifier, quadrupling the
//! effective transimpedance without changing the resistor. The resistor is
//! selected by a two-bit mux on GPIO.

/// Number of selectable gain codes.
pub const GAIN_CODES: u8 = 8;

/// Feedback resistors by mux position (kOhm).
const BASE_KOHM: [f32; 4] = [0.5, 10.0, 200.0, 4000.0];

/// Effective transimpedance for a gain code (kOhm), `None` for codes
/// outside 0..=7.
pub fn effective_kohm(code: u8) -> Option<f32> {
    if code >= GAIN_CODES {
        return None;
    }
    let base = BASE_KOHM[usize::from(code / 2)];
    Some(if code % 2 == 1 { base * 4.0 } else { base })
}

/// Two-bit resistor mux setting for a gain code.
pub fn mux_bits(code: u8) -> (bool, bool) {
    let sel = code / 2;
    (sel & 0b01 != 0, sel & 0b10 != 0)
}

/// Whether the code engages the 4x measurement amplifier.
pub fn boost_enabled(code: u8) -> bool {
    code % 2 == 1
}
