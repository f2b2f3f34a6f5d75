//! Unified error types for the potentiostat firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! consumer loop's error handling uniform. All variants are `Copy` so they
//! can be passed through the runner and telemetry path without allocation.
//!
//! Three categories with very different lifecycles:
//!
//! - [`ParseError`] / [`ValidationError`] — recoverable. The command is
//!   rejected, an `Error:` line goes out over telemetry, and the system
//!   stays Idle.
//! - [`RuntimeFault`] — fatal. Both periodic tasks stop, the DAC is forced
//!   to its safe default, and the runner enters a non-recoverable halt that
//!   only a board reset clears. A fault here means a build-time invariant
//!   was violated at run time and continuing could drive an unsafe
//!   electrode voltage.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Command frame could not be acquired or parsed.
    Parse(ParseError),
    /// A parsed request failed parameter validation or program derivation.
    Validation(ValidationError),
    /// A run-time safety invariant was violated (fatal).
    Fault(RuntimeFault),
    /// A start request arrived while an experiment is already running.
    Busy,
    /// Analog input read failed.
    AdcRead,
    /// A peripheral operation failed; the string names the peripheral.
    Hardware(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::Fault(e) => write!(f, "fault: {e}"),
            Self::Busy => write!(f, "experiment already running"),
            Self::AdcRead => write!(f, "ADC read failed"),
            Self::Hardware(what) => write!(f, "hardware: {what}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// No complete frame arrived before the receive deadline.
    FrameTimeout,
    /// Frame delimiters are malformed (`<` without a closing `/>`).
    MalformedDelimiter,
    /// A required token was not found in the frame.
    MissingToken(&'static str),
    /// The text following a token is not a valid decimal integer.
    NonNumericField(&'static str),
    /// More parameters supplied than any experiment accepts.
    TooManyParameters,
    /// The frame's command byte is not recognised.
    UnknownCommand(u8),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameTimeout => write!(f, "command not received"),
            Self::MalformedDelimiter => write!(f, "malformed frame delimiter"),
            Self::MissingToken(t) => write!(f, "missing token {t}"),
            Self::NonNumericField(t) => write!(f, "non-numeric value for {t}"),
            Self::TooManyParameters => write!(f, "too many experiment parameters"),
            Self::UnknownCommand(c) => write!(f, "command not recognised: 0x{c:02x}"),
        }
    }
}

impl core::error::Error for ParseError {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Which side of a limit a parameter violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    BelowMin,
    AboveMax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The experiment code in `%E:` is not a supported experiment.
    UnsupportedKind(i64),
    /// Parameter count does not match the selected experiment.
    WrongParameterCount { expected: usize, got: usize },
    /// A parameter is outside its `[min, max]` limits.
    ParameterOutOfRange { index: usize, bound: Bound },
    /// Sample rate outside the supported range.
    SampleRateOutOfRange,
    /// Gain code outside 0..=7.
    GainOutOfRange,
    /// Sweep slope of zero — the timing derivation would divide by zero.
    ZeroSlope,
    /// Vertex 1 equals vertex 2 — the sweep has no extent (`tSwitch` = 0).
    DegenerateVertices,
    /// Pulse step of zero — the staircase derivation would divide by zero.
    ZeroStep,
    /// Pulse period of zero — the cycle has no duration.
    ZeroPulsePeriod,
    /// Pulse period must exceed the pulse width.
    PulseWidthExceedsPeriod,
    /// Staircase direction inconsistent: `(start - stop) / step` < 1.
    StaircaseDirection,
    /// Stop voltage plus pulse amplitude exceeds the output ceiling.
    AmplitudeCeiling,
    /// Derived total experiment duration exceeds the allowed maximum.
    DurationCeiling,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedKind(code) => {
                write!(f, "selected experiment invalid/not supported ({code})")
            }
            Self::WrongParameterCount { expected, got } => {
                write!(f, "expected {expected} parameters, got {got}")
            }
            Self::ParameterOutOfRange { index, bound } => match bound {
                Bound::BelowMin => write!(f, "parameter {index} out of range (below min)"),
                Bound::AboveMax => write!(f, "parameter {index} out of range (above max)"),
            },
            Self::SampleRateOutOfRange => write!(f, "sample rate out of range"),
            Self::GainOutOfRange => write!(f, "gain out of range"),
            Self::ZeroSlope => write!(f, "sweep slope must be non-zero"),
            Self::DegenerateVertices => write!(f, "vertex 1 and vertex 2 must differ"),
            Self::ZeroStep => write!(f, "staircase step must be non-zero"),
            Self::ZeroPulsePeriod => write!(f, "pulse period must be non-zero"),
            Self::PulseWidthExceedsPeriod => write!(f, "pulse period must exceed pulse width"),
            Self::StaircaseDirection => write!(f, "start/stop/step directions inconsistent"),
            Self::AmplitudeCeiling => write!(f, "stop voltage plus amplitude exceeds ceiling"),
            Self::DurationCeiling => write!(f, "experiment duration exceeds maximum"),
        }
    }
}

impl core::error::Error for ValidationError {}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Runtime faults
// ---------------------------------------------------------------------------

/// Fatal run-time faults. Each carries a small numeric class that the halted
/// main loop keeps signalling until the board is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFault {
    /// The scaled DAC code fell outside 0..=65535 after the build-time
    /// guards should have made that impossible.
    DacCodeOutOfRange,
    /// The computed output voltage is NaN or infinite.
    NonFiniteOutput,
}

impl RuntimeFault {
    /// Numeric fault class, signalled continuously while halted.
    pub const fn class(self) -> u8 {
        match self {
            Self::DacCodeOutOfRange => 4,
            Self::NonFiniteOutput => 5,
        }
    }
}

impl fmt::Display for RuntimeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DacCodeOutOfRange => write!(f, "DAC out of range"),
            Self::NonFiniteOutput => write!(f, "output voltage not finite"),
        }
    }
}

impl core::error::Error for RuntimeFault {}

impl From<RuntimeFault> for Error {
    fn from(e: RuntimeFault) -> Self {
        Self::Fault(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
