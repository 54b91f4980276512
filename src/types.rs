//! Core types for session tracking and relay accounting
//!
//! This module provides the identifiers and counters used throughout the
//! proxy: which end of the relay a connection belongs to, per-session ids,
//! and byte accounting for a finished relay.

use uuid::Uuid;

/// Which end of the proxied control channel a connection belongs to
///
/// The proxy sits between a client-facing (frontend) connection and a
/// server-facing (backend) connection; errors and metrics are annotated
/// with the side they occurred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peer {
    /// The client-facing side of the proxy
    Frontend,
    /// The server-facing side of the proxy
    Backend,
}

impl Peer {
    /// The side data read from this peer is relayed to
    #[must_use]
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Frontend => Self::Backend,
            Self::Backend => Self::Frontend,
        }
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Frontend => write!(f, "frontend"),
            Self::Backend => write!(f, "backend"),
        }
    }
}

/// Unique identifier for proxied control sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new unique session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bytes relayed from the frontend to the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontendToBackendBytes(u64);

/// Bytes relayed from the backend to the frontend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendToFrontendBytes(u64);

macro_rules! byte_counter {
    ($name:ident) => {
        impl $name {
            /// Zero counter
            #[must_use]
            #[inline]
            pub const fn zero() -> Self {
                Self(0)
            }

            /// Counter starting at `n` bytes
            #[must_use]
            #[inline]
            pub const fn new(n: u64) -> Self {
                Self(n)
            }

            /// Counter advanced by `n` bytes
            #[must_use]
            #[inline]
            pub const fn add(self, n: usize) -> Self {
                Self(self.0 + n as u64)
            }

            /// Raw byte count
            #[must_use]
            #[inline]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }
    };
}

byte_counter!(FrontendToBackendBytes);
byte_counter!(BackendToFrontendBytes);

/// Byte accounting for a relay, both directions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferMetrics {
    pub frontend_to_backend: FrontendToBackendBytes,
    pub backend_to_frontend: BackendToFrontendBytes,
}

impl TransferMetrics {
    /// Record `n` bytes relayed away from `from`
    #[must_use]
    pub const fn record(self, from: Peer, n: usize) -> Self {
        match from {
            Peer::Frontend => Self {
                frontend_to_backend: self.frontend_to_backend.add(n),
                backend_to_frontend: self.backend_to_frontend,
            },
            Peer::Backend => Self {
                frontend_to_backend: self.frontend_to_backend,
                backend_to_frontend: self.backend_to_frontend.add(n),
            },
        }
    }

    /// Both directions as a `(frontend_to_backend, backend_to_frontend)` tuple
    #[must_use]
    pub const fn as_tuple(self) -> (u64, u64) {
        (
            self.frontend_to_backend.as_u64(),
            self.backend_to_frontend.as_u64(),
        )
    }
}

/// Validated relay buffer size (must be non-zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSize(usize);

impl BufferSize {
    /// Create a buffer size, rejecting zero
    pub fn try_new(size: usize) -> Result<Self, InvalidBufferSize> {
        if size == 0 {
            return Err(InvalidBufferSize);
        }
        Ok(Self(size))
    }

    /// Raw size in bytes
    #[must_use]
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

/// Error for a zero buffer size
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("buffer size cannot be 0")]
pub struct InvalidBufferSize;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_opposite() {
        assert_eq!(Peer::Frontend.opposite(), Peer::Backend);
        assert_eq!(Peer::Backend.opposite(), Peer::Frontend);
        assert_eq!(Peer::Frontend.opposite().opposite(), Peer::Frontend);
    }

    #[test]
    fn test_peer_display() {
        assert_eq!(format!("{}", Peer::Frontend), "frontend");
        assert_eq!(format!("{}", Peer::Backend), "backend");
    }

    #[test]
    fn test_session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new();
        let display = format!("{}", id);
        // UUID format: 8-4-4-4-12 hex characters
        assert_eq!(display.len(), 36);
        assert_eq!(display.chars().filter(|&c| c == '-').count(), 4);
    }

    #[test]
    fn test_byte_counter_add() {
        let c = FrontendToBackendBytes::zero().add(10).add(32);
        assert_eq!(c.as_u64(), 42);

        let c = BackendToFrontendBytes::new(100).add(1);
        assert_eq!(c.as_u64(), 101);
    }

    #[test]
    fn test_transfer_metrics_record() {
        let m = TransferMetrics::default()
            .record(Peer::Frontend, 7)
            .record(Peer::Backend, 11)
            .record(Peer::Frontend, 3);
        assert_eq!(m.as_tuple(), (10, 11));
    }

    #[test]
    fn test_buffer_size_rejects_zero() {
        assert!(BufferSize::try_new(0).is_err());
        assert_eq!(BufferSize::try_new(4096).unwrap().as_usize(), 4096);
    }
}
