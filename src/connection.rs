//! Control-connection adapter
//!
//! Wraps an established bidirectional byte stream with the read/write
//! primitives the control-channel engine needs: bounded line reads for
//! structured parsing, raw available-byte reads for the transparent relay,
//! and writes. The engine never opens or closes the underlying socket;
//! connections are created and owned by the caller for their whole
//! lifetime.
//!
//! Readiness is not polled here; the relay multiplexes both connections
//! with `tokio::select!`.

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};

use crate::constants::wire;
use crate::control_error::ControlError;
use crate::protocol::ProtocolError;
use crate::types::Peer;

/// Trait for async streams usable as control connections
///
/// Automatically implemented for any `AsyncRead + AsyncWrite + Unpin + Send`
/// type, so TCP streams, duplex test pipes, and future TLS wrappers all
/// work unchanged.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> AsyncStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// One side of the proxied control channel
///
/// Carries the stream, its [`Peer`] identity (used to annotate errors and
/// metrics), and a closed marker set once end-of-stream has been observed.
#[derive(Debug)]
pub struct ControlConnection<S> {
    peer: Peer,
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    max_line_len: usize,
    closed: bool,
}

impl<S: AsyncStream> ControlConnection<S> {
    /// Wrap a stream with the default line-length bound
    #[must_use]
    pub fn new(stream: S, peer: Peer) -> Self {
        Self::with_max_line_len(stream, peer, wire::MAX_LINE_LEN)
    }

    /// Wrap a stream with an explicit line-length bound
    #[must_use]
    pub fn with_max_line_len(stream: S, peer: Peer, max_line_len: usize) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            peer,
            reader: BufReader::new(read_half),
            writer: write_half,
            max_line_len,
            closed: false,
        }
    }

    /// Which side of the proxy this connection is
    #[inline]
    #[must_use]
    pub const fn peer(&self) -> Peer {
        self.peer
    }

    /// Whether end-of-stream has been observed on this connection
    #[inline]
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Record that end-of-stream was observed
    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }

    /// Read one control line, stripping the CRLF terminator
    ///
    /// Returns `Ok(None)` on a clean end of stream before any bytes were
    /// read (and marks the connection closed). A line exceeding the bound
    /// is [`ProtocolError::LineTooLong`]; non-UTF-8 bytes are
    /// [`ProtocolError::NotUtf8`]. If the stream ends mid-line the partial
    /// line is returned; the parsing layer decides whether that is valid.
    pub async fn read_line(&mut self) -> Result<Option<String>, ControlError> {
        let mut buf = Vec::with_capacity(128);
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| ControlError::io(self.peer, e))?;

        if n == 0 {
            self.closed = true;
            return Ok(None);
        }
        if n > self.max_line_len {
            return Err(ControlError::protocol(
                self.peer,
                ProtocolError::LineTooLong {
                    limit: self.max_line_len,
                },
            ));
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        let line = String::from_utf8(buf)
            .map_err(|_| ControlError::protocol(self.peer, ProtocolError::NotUtf8))?;
        Ok(Some(line))
    }

    /// Read whatever bytes are available, up to `buf.len()`
    ///
    /// Used by the transparent relay; drains any bytes already buffered by
    /// a previous line read before touching the socket. Returns `Ok(0)` at
    /// end of stream.
    pub async fn read_available(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf).await
    }

    /// Write raw bytes and flush
    pub async fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await
    }

    /// Shut down the write side of the stream
    ///
    /// The engine itself never calls this; it is for session drivers that
    /// own the connection's lifetime.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.writer.shutdown().await
    }
}
