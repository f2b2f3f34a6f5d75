//! Serial command grammar.
//!
//! A run command arrives as a single frame:
//!
//! ```text
//! <R%SR:60%G:2%E:1%EP:0,0,0,0,-200,-200,800,100,3,%/>
//! ```
//!
//! `<` and `/>` delimit the frame, `R` selects the run command, and the
//! `%SR:` / `%G:` / `%E:` / `%EP:` tokens carry sample rate, gain code,
//! experiment kind, and the positional parameter list. Token order is not
//! significant; each token is located by substring search. The single-byte
//! commands (`!` handshake, `x` stop) never form frames and are handled by
//! the consumer loop directly.

use crate::app::ports::{MonotonicClock, SerialPort};
use crate::error::{ParseError, ValidationError};
use crate::experiment::{ExperimentKind, RawRequest, MAX_PARAMS};
use heapless::Vec;

/// Upper bound on a frame, delimiters included.
pub const MAX_FRAME: usize = 128;

/// A lexed frame, fields still unchecked. [`ParsedFrame::into_request`]
/// resolves the kind code; everything else is range-checked by the
/// validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    pub sample_rate_hz: i64,
    pub gain: i64,
    pub kind_code: i64,
    pub params: Vec<i64, MAX_PARAMS>,
}

impl ParsedFrame {
    pub fn into_request(self) -> Result<RawRequest, ValidationError> {
        Ok(RawRequest {
            kind: ExperimentKind::from_code(self.kind_code)?,
            sample_rate_hz: self.sample_rate_hz,
            gain: self.gain,
            params: self.params,
        })
    }
}

/// Accumulate one `<...>` frame from the serial link.
///
/// Bytes before the opening `<` are discarded. Gives up with
/// [`ParseError::FrameTimeout`] when the deadline passes before the closing
/// `>` arrives, so a half-sent command cannot wedge the instrument.
pub fn read_frame(
    serial: &mut impl SerialPort,
    clock: &impl MonotonicClock,
    timeout_us: u64,
) -> Result<Vec<u8, MAX_FRAME>, ParseError> {
    let deadline = clock.now_us().saturating_add(timeout_us);
    let mut buf: Vec<u8, MAX_FRAME> = Vec::new();
    let mut in_frame = false;

    loop {
        if clock.now_us() >= deadline {
            return Err(ParseError::FrameTimeout);
        }
        let Some(byte) = serial.poll_byte() else {
            continue;
        };
        if !in_frame {
            if byte == b'<' {
                in_frame = true;
                // Cannot fail: the buffer is empty here.
                let _ = buf.push(byte);
            }
            continue;
        }
        if buf.push(byte).is_err() {
            return Err(ParseError::MalformedDelimiter);
        }
        if byte == b'>' {
            return Ok(buf);
        }
    }
}

/// Lex a delimited frame into its fields.
pub fn parse_frame(frame: &[u8]) -> Result<ParsedFrame, ParseError> {
    if frame.len() < 4 || frame[0] != b'<' || &frame[frame.len() - 2..] != b"/>" {
        return Err(ParseError::MalformedDelimiter);
    }
    let command = frame[1];
    if command != b'R' {
        return Err(ParseError::UnknownCommand(command));
    }
    let body = &frame[2..frame.len() - 2];

    let sample_rate_hz = token_int(body, b"%SR:", "SR")?;
    let gain = token_int(body, b"%G:", "G")?;
    let kind_code = token_int(body, b"%E:", "E")?;
    let params = token_params(body)?;

    Ok(ParsedFrame {
        sample_rate_hz,
        gain,
        kind_code,
        params,
    })
}

/// Locate `token` and read the integer immediately after it.
fn token_int(body: &[u8], token: &[u8], name: &'static str) -> Result<i64, ParseError> {
    let at = find(body, token).ok_or(ParseError::MissingToken(name))?;
    let (value, _) = read_int(&body[at + token.len()..])
        .ok_or(ParseError::NonNumericField(name))?;
    Ok(value)
}

/// Read the comma-separated list after `%EP:`. A trailing comma before the
/// next `%` is accepted.
fn token_params(body: &[u8]) -> Result<Vec<i64, MAX_PARAMS>, ParseError> {
    const TOKEN: &[u8] = b"%EP:";
    let at = find(body, TOKEN).ok_or(ParseError::MissingToken("EP"))?;
    let mut rest = &body[at + TOKEN.len()..];

    let mut params: Vec<i64, MAX_PARAMS> = Vec::new();
    loop {
        match rest.first() {
            None | Some(b'%') => return Ok(params),
            _ => {}
        }
        let (value, used) = read_int(rest).ok_or(ParseError::NonNumericField("EP"))?;
        params
            .push(value)
            .map_err(|_| ParseError::TooManyParameters)?;
        rest = &rest[used..];
        if rest.first() == Some(&b',') {
            rest = &rest[1..];
        }
    }
}

/// First occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Read a decimal integer with an optional leading `-`. Returns the value
/// and the number of bytes consumed, or `None` when no digit is present.
fn read_int(bytes: &[u8]) -> Option<(i64, usize)> {
    let mut i = 0;
    let negative = bytes.first() == Some(&b'-');
    if negative {
        i = 1;
    }
    let mut value: i64 = 0;
    let mut digits = 0;
    while let Some(&b) = bytes.get(i) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
        i += 1;
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    Some((if negative { -value } else { value }, i))
}
