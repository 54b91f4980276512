//! Structured command/response exchange
//!
//! These operations are used when the proxy must interpret control-channel
//! traffic rather than blindly relay it: they read exactly one command or
//! one (possibly multi-line) response from a single connection, or write a
//! serialized command/response out. The transparent byte relay lives in
//! [`crate::relay`]; callers pick per exchange which level they need.

use tokio::sync::mpsc;
use tracing::debug;

use crate::connection::{AsyncStream, ControlConnection};
use crate::control_error::ControlError;
use crate::protocol::{
    AccumulatorState, FtpCommand, FtpResponse, ProtocolError, ResponseAccumulator,
};
use crate::relay::RelayFlags;
use crate::types::Peer;

/// Sender half of a session's outward response channel
///
/// Responses pushed here are delivered toward whichever endpoint the
/// enclosing proxy session considers its client; see
/// [`ResponseTarget::Session`].
pub type OutwardResponseTx = mpsc::Sender<FtpResponse>;

/// Receive one command from `conn`
///
/// Reads exactly one line and parses it. A clean end of stream before any
/// bytes were read is [`ControlError::EndOfInput`]; there is no command to
/// return regardless of flags, and `ignore_eof` only classifies the
/// condition as an expected shutdown for the caller's logging.
pub async fn recv_cmd<S: AsyncStream>(
    conn: &mut ControlConnection<S>,
    flags: RelayFlags,
) -> Result<FtpCommand, ControlError> {
    match conn.read_line().await? {
        None => {
            if flags.ignore_eof {
                debug!("{} closed before sending a command (expected)", conn.peer());
            }
            Err(ControlError::eof(conn.peer()))
        }
        Some(line) => {
            FtpCommand::parse(&line).map_err(|e| ControlError::protocol(conn.peer(), e))
        }
    }
}

/// Receive one (possibly multi-line) response from `conn`
///
/// Drives a fresh [`ResponseAccumulator`] over lines read from the
/// connection. On success, returns the response together with the number of
/// wire lines consumed to assemble it.
///
/// EOF policy: end of stream before the first line is
/// [`ControlError::EndOfInput`] ("no response could be read"); end of
/// stream in the middle of a multi-line reply is a
/// [`ProtocolError::TruncatedResponse`] unless `ignore_eof` is set, in
/// which case the partial reply is discarded and `EndOfInput` is returned.
pub async fn recv_resp<S: AsyncStream>(
    conn: &mut ControlConnection<S>,
    flags: RelayFlags,
) -> Result<(FtpResponse, u32), ControlError> {
    let mut acc = ResponseAccumulator::new();

    loop {
        match conn.read_line().await? {
            Some(line) => {
                if let Some(resp) = acc
                    .feed_line(&line)
                    .map_err(|e| ControlError::protocol(conn.peer(), e))?
                {
                    return Ok((resp, acc.lines_consumed()));
                }
            }
            None => {
                return Err(match acc.state() {
                    AccumulatorState::AwaitFirstLine => ControlError::eof(conn.peer()),
                    _ if flags.ignore_eof => {
                        debug!(
                            "{} closed mid-reply after {} lines; discarding partial reply",
                            conn.peer(),
                            acc.lines_consumed()
                        );
                        ControlError::eof(conn.peer())
                    }
                    _ => ControlError::protocol(conn.peer(), ProtocolError::TruncatedResponse),
                });
            }
        }
    }
}

/// Serialize `cmd` and write it to `conn`
pub async fn send_cmd<S: AsyncStream>(
    conn: &mut ControlConnection<S>,
    cmd: &FtpCommand,
) -> Result<(), ControlError> {
    conn.write_bytes(&cmd.to_wire())
        .await
        .map_err(|e| ControlError::io(conn.peer(), e))
}

/// Destination for [`send_resp`]
///
/// The distinction the C-era API encoded as a nullable connection pointer,
/// made explicit: backend-facing code can push a relayed response toward
/// the session's own client without holding the frontend connection.
pub enum ResponseTarget<'a, S> {
    /// Write the serialized response to this connection
    Connection(&'a mut ControlConnection<S>),
    /// Deliver the response through the session's outward response channel
    Session(&'a OutwardResponseTx),
}

/// Serialize `resp` and deliver it to `target`
///
/// For [`ResponseTarget::Session`], a closed channel means the session's
/// client-facing end is gone and is reported as a frontend I/O failure.
pub async fn send_resp<S: AsyncStream>(
    target: ResponseTarget<'_, S>,
    resp: &FtpResponse,
) -> Result<(), ControlError> {
    match target {
        ResponseTarget::Connection(conn) => conn
            .write_bytes(&resp.to_wire())
            .await
            .map_err(|e| ControlError::io(conn.peer(), e)),
        ResponseTarget::Session(tx) => tx.send(resp.clone()).await.map_err(|_| {
            ControlError::io(
                Peer::Frontend,
                std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "outward response channel closed",
                ),
            )
        }),
    }
}
