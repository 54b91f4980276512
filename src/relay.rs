//! Readiness-driven relay between the frontend and backend connections
//!
//! One [`relay_round`] services whichever side of the proxy has data ready
//! and forwards it verbatim to the other side. The relay is transparent: it
//! preserves byte order and introduces no framing, so partial protocol
//! lines may cross round boundaries. Callers that want to interpret the
//! stream structurally use the operations in [`crate::exchange`] instead.
//!
//! The round is bounded: it is designed to be invoked repeatedly from an
//! outer loop (see [`crate::session`]) that owns timing policy, so an idle
//! round is a normal outcome, not an error.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, trace};

use crate::connection::{AsyncStream, ControlConnection};
use crate::control_error::ControlError;
use crate::pool::BufferPool;
use crate::types::Peer;

/// Behavior flags consulted by the relay and exchange operations
///
/// An explicit options struct rather than raw bits so call sites read as
/// `RelayFlags::IGNORE_EOF` instead of magic integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayFlags {
    /// Treat end-of-stream on either side as a normal terminal condition
    /// rather than an error
    pub ignore_eof: bool,
}

impl RelayFlags {
    /// No flags: EOF on either side is reported as an error
    pub const NONE: Self = Self { ignore_eof: false };

    /// End-of-stream is an expected session-end signal
    pub const IGNORE_EOF: Self = Self { ignore_eof: true };
}

/// Outcome of one relay round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayRound {
    /// The readiness wait expired with nothing to service
    Idle,
    /// Bytes were read from `from` and written to the opposite side
    Forwarded { from: Peer, bytes: usize },
    /// `peer` reached end of stream under `ignore_eof` and is now marked
    /// closed for future rounds
    SideClosed { peer: Peer },
    /// Both sides are closed; further rounds cannot make progress
    Finished,
}

/// Run one bounded round of readiness-driven relay
///
/// Waits for readability on the union of {frontend, backend} for at most
/// `round_timeout`, reads available bytes from whichever side is ready, and
/// writes them verbatim to the opposite side before returning. Bytes read
/// within a round are delivered in order, in that same round.
///
/// EOF policy: without [`RelayFlags::IGNORE_EOF`], end-of-stream is an
/// [`ControlError::EndOfInput`] naming the side; with it, the side is
/// marked closed and the round reports [`RelayRound::SideClosed`].
/// Servicing a connection already marked closed without `ignore_eof` is a
/// caller bug ([`ControlError::InvalidArgument`]); the earlier EOF would
/// have been fatal under those flags.
///
/// `Ok(_)` means "this round completed without a fatal condition", not
/// "relay finished"; loop until [`RelayRound::Finished`] or an error.
pub async fn relay_round<F, B>(
    frontend: &mut ControlConnection<F>,
    backend: &mut ControlConnection<B>,
    pool: &BufferPool,
    flags: RelayFlags,
    round_timeout: Duration,
) -> Result<RelayRound, ControlError>
where
    F: AsyncStream,
    B: AsyncStream,
{
    let frontend_open = !frontend.is_closed();
    let backend_open = !backend.is_closed();

    if !frontend_open && !backend_open {
        return Ok(RelayRound::Finished);
    }
    if (!frontend_open || !backend_open) && !flags.ignore_eof {
        return Err(ControlError::InvalidArgument {
            what: "relaying a closed connection without ignore_eof",
        });
    }

    let mut front_buf = pool.acquire();
    let mut back_buf = pool.acquire();

    let outcome = tokio::select! {
        res = frontend.read_available(&mut front_buf), if frontend_open => {
            match res {
                Ok(0) => eof_outcome(frontend, flags),
                Ok(n) => match backend.write_bytes(&front_buf[..n]).await {
                    Ok(()) => {
                        trace!("Relayed {} bytes frontend → backend", n);
                        Ok(RelayRound::Forwarded { from: Peer::Frontend, bytes: n })
                    }
                    Err(e) => Err(ControlError::io(Peer::Backend, e)),
                },
                Err(e) => Err(ControlError::io(Peer::Frontend, e)),
            }
        }

        res = backend.read_available(&mut back_buf), if backend_open => {
            match res {
                Ok(0) => eof_outcome(backend, flags),
                Ok(n) => match frontend.write_bytes(&back_buf[..n]).await {
                    Ok(()) => {
                        trace!("Relayed {} bytes backend → frontend", n);
                        Ok(RelayRound::Forwarded { from: Peer::Backend, bytes: n })
                    }
                    Err(e) => Err(ControlError::io(Peer::Frontend, e)),
                },
                Err(e) => Err(ControlError::io(Peer::Backend, e)),
            }
        }

        _ = sleep(round_timeout) => Ok(RelayRound::Idle),
    };

    pool.release(front_buf);
    pool.release(back_buf);
    outcome
}

/// Classify end-of-stream on `conn` per the EOF policy
fn eof_outcome<S: AsyncStream>(
    conn: &mut ControlConnection<S>,
    flags: RelayFlags,
) -> Result<RelayRound, ControlError> {
    let peer = conn.peer();
    if flags.ignore_eof {
        conn.mark_closed();
        debug!("{} closed the control connection (expected)", peer);
        Ok(RelayRound::SideClosed { peer })
    } else {
        Err(ControlError::eof(peer))
    }
}
