//! FTP control-channel proxy engine
//!
//! Sits between a client-facing (frontend) connection and a server-facing
//! (backend) connection and relays the FTP command/response protocol
//! between them while staying protocol-aware: commands and multi-line
//! replies are parsed, not treated as opaque bytes, so EOF, orderly
//! shutdown, and protocol violations are distinguishable.
//!
//! # Layers
//!
//! - [`protocol`]: pure wire codec. Command and reply parsing and
//!   serialization, multi-line reply accumulation. No I/O.
//! - [`connection`]: the adapter over an established async stream.
//!   Bounded line reads, raw reads for the relay, writes.
//! - [`relay`]: the readiness-driven byte relay between the two sides,
//!   with EOF policy governed by [`relay::RelayFlags`].
//! - [`exchange`]: structured receive/send of single commands and
//!   responses when the proxy must interpret traffic.
//! - [`session`]: the per-client driver tying it together. Greeting
//!   relay, the outer round loop, and the outward response channel.
//!
//! The engine never opens or closes sockets itself; connections are owned
//! by the caller (the session driver, or your own) for their whole
//! lifetime.

pub mod config;
pub mod connection;
pub mod constants;
pub mod control_error;
pub mod exchange;
pub mod logging;
pub mod pool;
pub mod protocol;
pub mod relay;
pub mod session;
pub mod types;

pub use config::{Config, ListenConfig, RelayConfig, ServerConfig, create_default_config, load_config};
pub use connection::{AsyncStream, ControlConnection};
pub use control_error::ControlError;
pub use exchange::{OutwardResponseTx, ResponseTarget, recv_cmd, recv_resp, send_cmd, send_resp};
pub use pool::BufferPool;
pub use protocol::{
    AccumulatorState, FtpCommand, FtpResponse, ProtocolError, ReplyCode, ReplyLine,
    ReplySeparator, ResponseAccumulator,
};
pub use relay::{RelayFlags, RelayRound, relay_round};
pub use session::ControlSession;
pub use types::{Peer, SessionId, TransferMetrics};
