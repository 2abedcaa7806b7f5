//! Parser for the marker-framed session protocol.
//!
//! Every response opens with a marker line starting with [`MARKER`]:
//!
//! - `= ERROR <message>` is a complete response with one error line.
//! - `= START OUTPUT<code>` opens output lines closed by `= END OUTPUT`.
//! - `= START STACKTRACE` opens error lines closed by `= END STACKTRACE`.

use std::collections::VecDeque;

use crate::codes::UNKNOWN_CODE;
use crate::error::ClientError;
use crate::transport::Response;

/// Prefix shared by every marker line.
pub const MARKER: &str = "= ";
/// Single-line error response.
pub const ERROR_MARKER: &str = "= ERROR";
/// Opens an output block; the result code follows without a separator.
pub const START_OUTPUT: &str = "= START OUTPUT";
/// Closes an output block.
pub const END_OUTPUT: &str = "= END OUTPUT";
/// Opens a stack-trace block.
pub const START_STACKTRACE: &str = "= START STACKTRACE";
/// Closes a stack-trace block.
pub const END_STACKTRACE: &str = "= END STACKTRACE";

/// Supplies protocol lines one at a time.
pub trait LineSource {
    /// Returns the next line with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::WorkerExited`] at end of stream, or the I/O
    /// error that interrupted the read.
    fn read_line(&mut self) -> Result<String, ClientError>;
}

impl LineSource for VecDeque<String> {
    fn read_line(&mut self) -> Result<String, ClientError> {
        self.pop_front()
            .map(|line| line.trim().to_owned())
            .ok_or(ClientError::WorkerExited)
    }
}

/// Reads one complete response frame from `source`.
///
/// # Errors
///
/// Returns [`ClientError::ProtocolViolation`] when the lines break the
/// framing grammar, and propagates the source's errors.
pub fn read_frame<S: LineSource + ?Sized>(source: &mut S) -> Result<Response, ClientError> {
    let marker = source.read_line()?;
    if !marker.starts_with(MARKER) {
        return Err(ClientError::protocol("expected a marker line", marker));
    }

    let mut response = if let Some(rest) = marker.strip_prefix(ERROR_MARKER) {
        let message = match rest.strip_prefix(' ') {
            Some(message) => message,
            None if rest.is_empty() => rest,
            None => return Err(ClientError::protocol("unknown marker", marker)),
        };
        Response::new(
            parse_error_code(message),
            Vec::new(),
            vec![message.to_owned()],
        )
    } else if let Some(suffix) = marker.strip_prefix(START_OUTPUT) {
        let code = parse_output_code(suffix).ok_or_else(|| {
            ClientError::protocol("invalid result code in output marker", marker.as_str())
        })?;
        let output = read_block(source, END_OUTPUT)?;
        Response::new(code, output, Vec::new())
    } else if marker == START_STACKTRACE {
        let error = read_block(source, END_STACKTRACE)?;
        Response::new(UNKNOWN_CODE, Vec::new(), error)
    } else {
        return Err(ClientError::protocol("unknown marker", marker));
    };

    collapse_blank(&mut response.output);
    collapse_blank(&mut response.error);
    Ok(response)
}

/// Collects lines up to the next marker line, which must equal `end`.
fn read_block<S: LineSource + ?Sized>(
    source: &mut S,
    end: &str,
) -> Result<Vec<String>, ClientError> {
    let mut lines = Vec::new();
    loop {
        let line = source.read_line()?;
        if line.starts_with(MARKER) {
            if line == end {
                return Ok(lines);
            }
            return Err(ClientError::protocol(format!("expected `{end}`"), line));
        }
        lines.push(line);
    }
}

fn collapse_blank(lines: &mut Vec<String>) {
    if matches!(lines.as_slice(), [only] if only.is_empty()) {
        lines.clear();
    }
}

/// Extracts the result code from the leading token of an error message.
///
/// `0x`/`0X` introduces a hexadecimal code and an all-digit token a decimal
/// one. Anything else, including an empty message, yields [`UNKNOWN_CODE`].
#[must_use]
pub fn parse_error_code(message: &str) -> i64 {
    let Some(token) = message.split_whitespace().next() else {
        return UNKNOWN_CODE;
    };
    let parsed = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .map_or_else(
            || parse_decimal(token),
            |hex| {
                i64::from_str_radix(hex, 16)
                    .ok()
                    .filter(|_| !hex.starts_with(['+', '-']))
            },
        );
    parsed.map_or(UNKNOWN_CODE, normalise)
}

fn parse_output_code(suffix: &str) -> Option<i64> {
    let digits = suffix.trim();
    if digits.is_empty() {
        return Some(0);
    }
    parse_decimal(digits).map(normalise)
}

fn parse_decimal(token: &str) -> Option<i64> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Maps negative 32-bit codes onto their unsigned representation.
///
/// Agents print HRESULT and NTSTATUS values as signed integers, so
/// `-1073741715` and `0xC000006D` name the same code.
fn normalise(code: i64) -> i64 {
    if code >= 0 {
        return code;
    }
    i32::try_from(code).map_or(code, |signed| i64::from(signed.cast_unsigned()))
}
