//! Per-client control session
//!
//! A [`ControlSession`] owns the frontend and backend connections for one
//! proxied client, relays the backend's greeting, then drives relay rounds
//! from an outer loop until a terminal condition. It also owns the
//! session's outward response channel: structured responses pushed there by
//! backend-facing code are written to the frontend between rounds.
//!
//! The session is the connection owner the engine core defers to: the
//! relay and exchange operations never close a connection themselves; both
//! streams are closed when the session is dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::{AsyncStream, ControlConnection};
use crate::control_error::ControlError;
use crate::exchange::{self, OutwardResponseTx, ResponseTarget};
use crate::pool::BufferPool;
use crate::protocol::FtpResponse;
use crate::relay::{RelayFlags, RelayRound, relay_round};
use crate::types::{Peer, SessionId, TransferMetrics};

/// Queued outward responses before senders are backpressured
const OUTWARD_CHANNEL_CAPACITY: usize = 16;

/// One proxied FTP control session
#[derive(Debug)]
pub struct ControlSession<F, B> {
    id: SessionId,
    frontend: ControlConnection<F>,
    backend: ControlConnection<B>,
    pool: BufferPool,
    flags: RelayFlags,
    round_timeout: Duration,
    outward_tx: OutwardResponseTx,
    outward_rx: mpsc::Receiver<FtpResponse>,
    metrics: TransferMetrics,
}

impl<F: AsyncStream, B: AsyncStream> ControlSession<F, B> {
    /// Build a session over an accepted frontend stream and a dialed
    /// backend stream
    #[must_use]
    pub fn new(
        frontend_stream: F,
        backend_stream: B,
        pool: BufferPool,
        flags: RelayFlags,
        round_timeout: Duration,
    ) -> Self {
        let (outward_tx, outward_rx) = mpsc::channel(OUTWARD_CHANNEL_CAPACITY);
        Self {
            id: SessionId::new(),
            frontend: ControlConnection::new(frontend_stream, Peer::Frontend),
            backend: ControlConnection::new(backend_stream, Peer::Backend),
            pool,
            flags,
            round_timeout,
            outward_tx,
            outward_rx,
            metrics: TransferMetrics::default(),
        }
    }

    /// This session's unique id
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Handle for pushing responses toward this session's client
    ///
    /// Backend-facing code uses this with [`ResponseTarget::Session`] to
    /// deliver a relayed response frontward without holding the frontend
    /// connection.
    #[must_use]
    pub fn outward_channel(&self) -> OutwardResponseTx {
        self.outward_tx.clone()
    }

    /// Receive the backend's greeting and forward it to the client
    ///
    /// FTP servers speak first; the proxy relays the (possibly multi-line)
    /// `220` banner structurally so a truncated greeting is caught before
    /// the byte relay starts.
    pub async fn relay_greeting(&mut self) -> Result<FtpResponse, ControlError> {
        let (greeting, nlines) = exchange::recv_resp(&mut self.backend, self.flags).await?;
        debug!(
            "Session {} backend greeting {} ({} lines)",
            self.id,
            greeting.code(),
            nlines
        );
        exchange::send_resp(ResponseTarget::Connection(&mut self.frontend), &greeting).await?;
        Ok(greeting)
    }

    /// Drive relay rounds until the session ends
    ///
    /// Returns byte accounting on a normal end (both sides closed under
    /// `ignore_eof`). On error, the error is classified and logged here;
    /// dropping the returned session closes both streams.
    pub async fn run(mut self) -> Result<TransferMetrics, ControlError> {
        loop {
            self.flush_outward().await?;

            match relay_round(
                &mut self.frontend,
                &mut self.backend,
                &self.pool,
                self.flags,
                self.round_timeout,
            )
            .await
            {
                Ok(RelayRound::Idle) => {}
                Ok(RelayRound::Forwarded { from, bytes }) => {
                    self.metrics = self.metrics.record(from, bytes);
                }
                Ok(RelayRound::SideClosed { peer }) => {
                    debug!("Session {}: {} side closed", self.id, peer);
                }
                Ok(RelayRound::Finished) => {
                    let (c2s, s2c) = self.metrics.as_tuple();
                    info!(
                        "Session {} complete | ↑{}B ↓{}B",
                        self.id, c2s, s2c
                    );
                    return Ok(self.metrics);
                }
                Err(e) => {
                    let (c2s, s2c) = self.metrics.as_tuple();
                    if e.is_expected_shutdown(self.flags.ignore_eof) {
                        debug!("Session {} closed: {} | ↑{}B ↓{}B", self.id, e, c2s, s2c);
                    } else {
                        warn!("Session {} failed: {} | ↑{}B ↓{}B", self.id, e, c2s, s2c);
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Deliver any queued outward responses to the frontend
    async fn flush_outward(&mut self) -> Result<(), ControlError> {
        while let Ok(resp) = self.outward_rx.try_recv() {
            debug!("Session {} outward response {}", self.id, resp.code());
            exchange::send_resp(ResponseTarget::Connection(&mut self.frontend), &resp).await?;
        }
        Ok(())
    }
}
