//! FTP reply parsing and serialization
//!
//! This module implements the reply half of the FTP control-channel wire
//! format according to [RFC 959](https://datatracker.ietf.org/doc/html/rfc959)
//! with byte-level parsing on the hot path.
//!
//! # Reply Format
//!
//! Per [RFC 959 Section 4.2](https://datatracker.ietf.org/doc/html/rfc959#section-4.2):
//! ```text
//! reply        = reply-code SP text CRLF
//! reply-code   = 3DIGIT
//! ```
//!
//! # Multi-line Replies
//!
//! Per [RFC 959 Section 4.2](https://datatracker.ietf.org/doc/html/rfc959#section-4.2),
//! a reply may span several lines. The first line uses a hyphen in place of
//! the space separator (`DDD-text`), interior lines are free text (servers
//! may echo `DDD-` prefixes mid-reply), and the reply is terminated by a
//! line that begins with the same code followed by a space (`DDD text`).

use crate::constants::wire;
use crate::protocol::ProtocolError;

/// A three-digit FTP reply code, kept as the exact ASCII digits
///
/// Per [RFC 959 Section 4.2](https://datatracker.ietf.org/doc/html/rfc959#section-4.2),
/// reply codes are always exactly three digits. Keeping the digit bytes
/// (rather than a parsed integer) preserves the wire form for relay and
/// makes terminator matching a plain prefix comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyCode([u8; 3]);

impl ReplyCode {
    /// Parse a reply code from the first three bytes of a reply line
    ///
    /// Returns `None` unless all three bytes are ASCII digits.
    #[inline]
    #[must_use]
    pub fn from_line_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < wire::REPLY_CODE_LEN {
            return None;
        }

        // Direct ASCII digit check without UTF-8 overhead; reply codes are
        // exactly 3 ASCII digits per RFC 959.
        let d0 = data[0].wrapping_sub(b'0');
        let d1 = data[1].wrapping_sub(b'0');
        let d2 = data[2].wrapping_sub(b'0');
        if d0 > 9 || d1 > 9 || d2 > 9 {
            return None;
        }

        Some(Self([data[0], data[1], data[2]]))
    }

    /// Create a reply code from its textual form (e.g. `"220"`)
    pub fn new(code: &str) -> Result<Self, ProtocolError> {
        Self::from_line_bytes(code.as_bytes())
            .filter(|_| code.len() == wire::REPLY_CODE_LEN)
            .ok_or_else(|| ProtocolError::InvalidReplyCode(code.to_string()))
    }

    /// The code as a string slice (always three ASCII digits)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        // The constructor guarantees ASCII digits.
        std::str::from_utf8(&self.0).expect("reply code is ASCII")
    }

    /// The code as its numeric value (100..=999)
    #[inline]
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        let d = |b: u8| (b - b'0') as u16;
        d(self.0[0]) * 100 + d(self.0[1]) * 10 + d(self.0[2])
    }

    /// The raw digit bytes
    #[inline]
    #[must_use]
    pub const fn digits(&self) -> [u8; 3] {
        self.0
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Separator between reply code and text, encoding continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySeparator {
    /// `SP`: this is the final line of the reply
    Final,
    /// `-`: more reply lines follow
    Continuation,
}

impl ReplySeparator {
    /// Decode the fourth byte of a reply line
    #[inline]
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            wire::SEPARATOR_FINAL => Some(Self::Final),
            wire::SEPARATOR_CONTINUATION => Some(Self::Continuation),
            _ => None,
        }
    }

    /// The wire byte for this separator
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Final => wire::SEPARATOR_FINAL,
            Self::Continuation => wire::SEPARATOR_CONTINUATION,
        }
    }
}

/// One parsed reply line: code, separator, and trailing text
///
/// Borrowed view over the input line; the [`ResponseAccumulator`] owns the
/// assembled reply.
///
/// [`ResponseAccumulator`]: crate::protocol::ResponseAccumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyLine<'a> {
    pub code: ReplyCode,
    pub separator: ReplySeparator,
    pub text: &'a str,
}

impl<'a> ReplyLine<'a> {
    /// Parse a reply line
    ///
    /// The first three characters must be ASCII digits and the fourth a
    /// space (final line) or hyphen (continuation); anything else is a
    /// [`ProtocolError::MalformedReplyLine`].
    ///
    /// A bare `DDD` line with no separator is malformed per RFC 959; the
    /// grammar requires the separator even when the text is empty.
    pub fn parse(line: &'a str) -> Result<Self, ProtocolError> {
        let bytes = line.as_bytes();

        let code = ReplyCode::from_line_bytes(bytes)
            .ok_or_else(|| ProtocolError::MalformedReplyLine(line.to_string()))?;

        let sep_byte = *bytes
            .get(wire::REPLY_CODE_LEN)
            .ok_or_else(|| ProtocolError::MalformedReplyLine(line.to_string()))?;
        let separator = ReplySeparator::from_byte(sep_byte)
            .ok_or_else(|| ProtocolError::MalformedReplyLine(line.to_string()))?;

        Ok(Self {
            code,
            separator,
            text: &line[wire::REPLY_CODE_LEN + 1..],
        })
    }

    /// Whether this line terminates a reply
    #[inline]
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self.separator, ReplySeparator::Final)
    }
}

/// A complete FTP reply: code, newline-joined message body, and the number
/// of wire lines it was assembled from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpResponse {
    code: ReplyCode,
    message: String,
    nlines: u32,
}

impl FtpResponse {
    /// Build a reply from a code and message body
    ///
    /// A message containing `\n` becomes a multi-line reply on the wire;
    /// the line count is derived from the body.
    #[must_use]
    pub fn new(code: ReplyCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let nlines = message.split('\n').count() as u32;
        Self {
            code,
            message,
            nlines,
        }
    }

    /// Build a reply from already-assembled segments, recording how many
    /// wire lines were consumed
    ///
    /// Used by the accumulator, where the consumed-line count is an output
    /// of the state machine rather than derived from the body.
    pub(crate) fn from_segments(code: ReplyCode, segments: Vec<String>, nlines: u32) -> Self {
        Self {
            code,
            message: segments.join("\n"),
            nlines,
        }
    }

    /// The three-digit reply code
    #[inline]
    #[must_use]
    pub const fn code(&self) -> ReplyCode {
        self.code
    }

    /// The message body; multi-line replies are newline-joined
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Number of wire lines this reply occupies
    #[inline]
    #[must_use]
    pub const fn nlines(&self) -> u32 {
        self.nlines
    }

    /// Whether the wire form spans more than one line
    #[inline]
    #[must_use]
    pub const fn is_multiline(&self) -> bool {
        self.nlines > 1
    }

    /// Serialize to wire form, CRLF-terminated
    ///
    /// Single-line: `DDD SP text CRLF`. Multi-line: first line `DDD-text`,
    /// interior segments verbatim, final line `DDD SP text`, the shape the
    /// accumulator reverses exactly.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.message.len() + 8 * self.nlines as usize);
        let mut segments = self.message.split('\n').peekable();
        let mut first = true;

        while let Some(segment) = segments.next() {
            let last = segments.peek().is_none();
            if first && last {
                out.extend_from_slice(&self.code.digits());
                out.push(ReplySeparator::Final.as_byte());
                out.extend_from_slice(segment.as_bytes());
            } else if first {
                out.extend_from_slice(&self.code.digits());
                out.push(ReplySeparator::Continuation.as_byte());
                out.extend_from_slice(segment.as_bytes());
            } else if last {
                out.extend_from_slice(&self.code.digits());
                out.push(ReplySeparator::Final.as_byte());
                out.extend_from_slice(segment.as_bytes());
            } else {
                out.extend_from_slice(segment.as_bytes());
            }
            out.extend_from_slice(wire::CRLF);
            first = false;
        }

        out
    }
}

impl std::fmt::Display for FtpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_multiline() {
            write!(f, "{}-…({} lines)", self.code, self.nlines)
        } else {
            write!(f, "{} {}", self.code, self.message)
        }
    }
}
