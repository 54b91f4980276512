//! FTP control-channel wire codec
//!
//! Pure parsing and serialization for the FTP control protocol
//! ([RFC 959](https://datatracker.ietf.org/doc/html/rfc959)): command lines,
//! reply lines, and stateful multi-line reply assembly. No I/O happens in
//! this module; connections and relay policy live in [`crate::connection`]
//! and [`crate::relay`].

mod accumulator;
mod command;
mod error;
mod response;

pub use accumulator::{AccumulatorState, ResponseAccumulator};
pub use command::FtpCommand;
pub use error::ProtocolError;
pub use response::{FtpResponse, ReplyCode, ReplyLine, ReplySeparator};
