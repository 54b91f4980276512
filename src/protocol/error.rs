//! Wire-grammar errors for the FTP control channel

use thiserror::Error;

/// Errors raised when received bytes do not conform to the control-channel
/// wire grammar
///
/// These are never retried: a peer that emits malformed protocol is fatal
/// for the exchange in progress.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtocolError {
    /// An empty (or all-whitespace) command line has no verb to parse
    #[error("empty command line")]
    EmptyCommandLine,

    /// Reply line shorter than `DDD<sep>` or with a non-space/hyphen
    /// fourth character
    #[error("malformed reply line: {0:?}")]
    MalformedReplyLine(String),

    /// Reply code that is not exactly three ASCII digits
    #[error("reply code must be three ASCII digits, got {0:?}")]
    InvalidReplyCode(String),

    /// Control line longer than the configured bound
    #[error("control line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    /// Stream ended in the middle of a multi-line reply
    #[error("multi-line reply truncated by end of stream")]
    TruncatedResponse,

    /// Multi-line reply with more lines than the configured bound
    #[error("multi-line reply exceeds {limit} lines")]
    TooManyReplyLines { limit: usize },

    /// Control line that is not valid UTF-8
    #[error("control line is not valid UTF-8")]
    NotUtf8,
}
