//! Error types for control-channel operations
//!
//! This module provides the error taxonomy shared by the relay multiplexer
//! and the structured exchange operations, annotated with which side of the
//! proxy the failure occurred on.

use std::fmt;

use crate::protocol::ProtocolError;
use crate::types::Peer;

/// Errors returned by control-channel operations
///
/// All variants are returned synchronously from the operation that detects
/// them; nothing is swallowed internally.
#[derive(Debug)]
#[non_exhaustive]
pub enum ControlError {
    /// Caller bug: an argument combination the API contract forbids
    ///
    /// Never retried; fix the call site.
    InvalidArgument { what: &'static str },

    /// Orderly end of stream on one side
    ///
    /// Expected during shutdown; whether it is fatal depends on the
    /// caller's [`RelayFlags`](crate::relay::RelayFlags).
    EndOfInput { peer: Peer },

    /// Received bytes do not conform to the control-channel wire grammar
    Protocol { peer: Peer, source: ProtocolError },

    /// Transport failure on one side
    Io {
        peer: Peer,
        source: std::io::Error,
    },
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { what } => {
                write!(f, "invalid argument: {}", what)
            }
            Self::EndOfInput { peer } => {
                write!(f, "end of input on {} connection", peer)
            }
            Self::Protocol { peer, source } => {
                write!(f, "protocol error from {}: {}", peer, source)
            }
            Self::Io { peer, source } => {
                write!(f, "I/O error on {} connection: {}", peer, source)
            }
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Protocol { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl ControlError {
    /// End-of-input on the given side
    #[must_use]
    pub const fn eof(peer: Peer) -> Self {
        Self::EndOfInput { peer }
    }

    /// Wire-grammar violation from the given side
    #[must_use]
    pub const fn protocol(peer: Peer, source: ProtocolError) -> Self {
        Self::Protocol { peer, source }
    }

    /// Transport failure on the given side
    #[must_use]
    pub const fn io(peer: Peer, source: std::io::Error) -> Self {
        Self::Io { peer, source }
    }

    /// Check if this is an orderly end of stream
    #[must_use]
    pub const fn is_end_of_input(&self) -> bool {
        matches!(self, Self::EndOfInput { .. })
    }

    /// Check if this is a wire-grammar violation
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Which side of the proxy the error occurred on, when attributable
    #[must_use]
    pub const fn peer(&self) -> Option<Peer> {
        match self {
            Self::EndOfInput { peer }
            | Self::Protocol { peer, .. }
            | Self::Io { peer, .. } => Some(*peer),
            Self::InvalidArgument { .. } => None,
        }
    }

    /// Check if this error is an expected session-end signal
    ///
    /// An end-of-input when the caller opted into `ignore_eof` is normal
    /// shutdown and must not be reported as a failure.
    #[must_use]
    pub const fn is_expected_shutdown(&self, ignore_eof: bool) -> bool {
        ignore_eof && self.is_end_of_input()
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self, ignore_eof: bool) -> tracing::Level {
        match self {
            // Flagged EOF is a normal session end, not an error
            Self::EndOfInput { .. } if ignore_eof => tracing::Level::DEBUG,
            Self::EndOfInput { .. } => tracing::Level::WARN,
            // Malformed protocol needs attention
            Self::Protocol { .. } => tracing::Level::ERROR,
            // Caller bugs need attention
            Self::InvalidArgument { .. } => tracing::Level::ERROR,
            // Transport failures might be transient network conditions
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::Level::DEBUG
            }
            Self::Io { .. } => tracing::Level::WARN,
        }
    }
}
