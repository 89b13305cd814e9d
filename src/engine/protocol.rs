//! Text request protocol: `sequence:ops:operand1:operand2:delays`, ops and delays comma-separated.

use log::error;
use std::io::BufRead;
use std::str::FromStr;

use crate::Request;
use crate::engine::operations::OperationType;
use crate::error::ProtocolError;

/// Input line that ends the session.
pub const END_OF_INPUT: &str = "0";

const FIELD_SEPARATOR: char = ':';
const LIST_SEPARATOR: char = ',';
const FIELD_COUNT: usize = 5;

/// Parse one request line. Surrounding whitespace on fields and list items is ignored.
pub fn parse_request(line: &str) -> Result<Request, ProtocolError> {
    if line.matches(FIELD_SEPARATOR).count() != FIELD_COUNT - 1 {
        return Err(ProtocolError::Syntax);
    }
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.iter().any(|f| f.is_empty()) {
        return Err(ProtocolError::message("empty field"));
    }

    let sequence = parse_int::<u64>(fields[0], false, "sequence")?;

    let operations = split_list(fields[1])
        .map(|s| {
            OperationType::from_str(s)
                .map_err(|_| ProtocolError::message(format!("unknown service '{s}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if operations.is_empty() {
        return Err(ProtocolError::message("no services requested"));
    }

    let operand1 = parse_int::<i64>(fields[2], true, "operand")?;
    let operand2 = parse_int::<i64>(fields[3], true, "operand")?;

    let delays = split_list(fields[4])
        .map(|s| parse_int::<u64>(s, false, "delay"))
        .collect::<Result<Vec<_>, _>>()?;
    if delays.is_empty() {
        return Err(ProtocolError::message("no delays given"));
    }

    Ok(Request {
        sequence,
        operations,
        operand1,
        operand2,
        delays,
    })
}

fn split_list(field: &str) -> impl Iterator<Item = &str> {
    field
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Digits only (optionally one leading '-'). Well-formed but out of range is a conversion error.
fn parse_int<T: FromStr>(field: &str, signed: bool, what: &str) -> Result<T, ProtocolError> {
    let digits = match field.strip_prefix('-') {
        Some(rest) if signed => rest,
        _ => field,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::message(format!("invalid {what} '{field}'")));
    }
    field.parse::<T>().map_err(|_| ProtocolError::Conversion {
        value: field.to_string(),
    })
}

/// Reads request lines until a line that is exactly `0`, or end of stream.
/// Malformed lines (including invalid UTF-8) are logged and skipped. Only an I/O error ends input early.
pub struct LineSource<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    finished: bool,
    rejected: usize,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            finished: false,
            rejected: 0,
        }
    }

    /// Lines skipped because they failed to decode or parse.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Next raw line without its terminator. `None` at end of stream or on I/O error.
    fn read_line(&mut self) -> Option<&[u8]> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let line = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf);
                Some(line.strip_suffix(b"\r").unwrap_or(line))
            }
            Err(e) => {
                error!("read request: {e}");
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = Request;

    fn next(&mut self) -> Option<Request> {
        if self.finished {
            return None;
        }
        loop {
            let Some(raw) = self.read_line() else {
                self.finished = true;
                return None;
            };
            let outcome = match std::str::from_utf8(raw) {
                Ok(line) if line == END_OF_INPUT => None,
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => Some(parse_request(line).map_err(|e| e.to_string())),
                Err(e) => Some(Err(format!("request line is not valid UTF-8: {e}"))),
            };
            let Some(parsed) = outcome else {
                self.finished = true;
                return None;
            };
            match parsed {
                Ok(request) => return Some(request),
                Err(msg) => {
                    error!("{msg}");
                    self.rejected += 1;
                }
            }
        }
    }
}
