//! Stateful assembly of multi-line FTP replies
//!
//! Per [RFC 959 Section 4.2](https://datatracker.ietf.org/doc/html/rfc959#section-4.2),
//! a reply opened with `DDD-text` continues until a line beginning with the
//! same code followed by a space. Interior lines are free text (servers may
//! even echo `DDD-` prefixes mid-reply) and are absorbed verbatim.
//!
//! The accumulator is a single-response state machine: feed it wire lines
//! one at a time until it hands back a completed [`FtpResponse`], then
//! discard it. I/O and EOF policy stay with the caller; this type only
//! encodes the continuation grammar.

use crate::constants::wire;
use crate::protocol::response::{FtpResponse, ReplyCode, ReplyLine};
use crate::protocol::ProtocolError;

/// Accumulator progress through one reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    /// No line consumed yet; the next line fixes the reply code
    AwaitFirstLine,
    /// Inside a multi-line reply, waiting for the terminator line
    Continuing,
    /// Terminal: the reply has been handed back
    Complete,
}

/// State machine assembling one FTP reply from wire lines
///
/// A fresh accumulator is required per response; feeding a completed
/// accumulator is a caller bug.
#[derive(Debug)]
pub struct ResponseAccumulator {
    state: AccumulatorState,
    code: Option<ReplyCode>,
    segments: Vec<String>,
    nlines: u32,
    max_lines: usize,
}

impl ResponseAccumulator {
    /// Accumulator with the default line cap ([`wire::MAX_REPLY_LINES`])
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_lines(wire::MAX_REPLY_LINES)
    }

    /// Accumulator with an explicit cap on consumed lines
    #[must_use]
    pub fn with_max_lines(max_lines: usize) -> Self {
        Self {
            state: AccumulatorState::AwaitFirstLine,
            code: None,
            segments: Vec::new(),
            nlines: 0,
            max_lines,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub const fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Number of wire lines consumed so far
    #[inline]
    #[must_use]
    pub const fn lines_consumed(&self) -> u32 {
        self.nlines
    }

    /// Whether the reply has completed
    #[inline]
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.state, AccumulatorState::Complete)
    }

    /// Feed one wire line (CRLF already stripped)
    ///
    /// Returns `Ok(Some(response))` when this line completes the reply,
    /// `Ok(None)` when more lines are needed. The first line must parse as
    /// a reply line; a reply opened with a continuation separator never
    /// completes without consuming at least one further line.
    ///
    /// # Panics
    ///
    /// Panics if called after the reply completed; use a fresh accumulator
    /// per response.
    pub fn feed_line(&mut self, line: &str) -> Result<Option<FtpResponse>, ProtocolError> {
        match self.state {
            AccumulatorState::AwaitFirstLine => {
                let first = ReplyLine::parse(line)?;
                self.code = Some(first.code);
                self.segments.push(first.text.to_string());
                self.nlines = 1;

                if first.is_final() {
                    self.state = AccumulatorState::Complete;
                    return Ok(Some(self.take_response()));
                }
                self.state = AccumulatorState::Continuing;
                Ok(None)
            }

            AccumulatorState::Continuing => {
                if self.nlines as usize >= self.max_lines {
                    return Err(ProtocolError::TooManyReplyLines {
                        limit: self.max_lines,
                    });
                }
                self.nlines += 1;

                let code = self.code.expect("code fixed by first line");
                if let Some(text) = terminator_text(line, code) {
                    self.segments.push(text.to_string());
                    self.state = AccumulatorState::Complete;
                    return Ok(Some(self.take_response()));
                }

                // Interior line, absorbed verbatim. This covers free text
                // and `DDD-` echoes of the reply code.
                self.segments.push(line.to_string());
                Ok(None)
            }

            AccumulatorState::Complete => {
                unreachable!("response accumulator fed after completion")
            }
        }
    }

    fn take_response(&mut self) -> FtpResponse {
        let code = self.code.expect("code fixed by first line");
        FtpResponse::from_segments(code, std::mem::take(&mut self.segments), self.nlines)
    }
}

impl Default for ResponseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// If `line` terminates a reply opened with `code` (`DDD SP text`), return
/// the trailing text
#[inline]
fn terminator_text(line: &str, code: ReplyCode) -> Option<&str> {
    let bytes = line.as_bytes();
    let digits = code.digits();
    if bytes.len() > wire::REPLY_CODE_LEN
        && bytes[..wire::REPLY_CODE_LEN] == digits
        && bytes[wire::REPLY_CODE_LEN] == wire::SEPARATOR_FINAL
    {
        Some(&line[wire::REPLY_CODE_LEN + 1..])
    } else {
        None
    }
}
