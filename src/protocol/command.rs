//! FTP command parsing and serialization
//!
//! This module implements the command half of the FTP control-channel wire
//! format according to [RFC 959](https://datatracker.ietf.org/doc/html/rfc959).
//!
//! # Command Format
//!
//! Per [RFC 959 Section 5.3.1](https://datatracker.ietf.org/doc/html/rfc959#section-5.3.1):
//! ```text
//! command-line = command [ SP arguments ] CRLF
//! ```
//!
//! The FTP command grammar has no quoting or escaping, so raw whitespace
//! splitting is the correct tokenization. Verbs are case-insensitive on the
//! wire and normalized to uppercase here so call sites can compare them
//! directly.

use crate::constants::wire;
use crate::protocol::ProtocolError;

/// A parsed FTP command: case-normalized verb plus ordered argument tokens
///
/// Owns its storage and is immutable once parsed. The proxy does not
/// interpret per-verb semantics (commands are relayed, not executed), so
/// the representation stays generic rather than enumerating verbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpCommand {
    verb: String,
    args: Vec<String>,
}

impl FtpCommand {
    /// Parse one command line
    ///
    /// Splits on whitespace; the first token is the verb (uppercased), the
    /// remainder are argument tokens. An empty or all-whitespace line is a
    /// [`ProtocolError::EmptyCommandLine`].
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut tokens = line.split_ascii_whitespace();
        let verb = tokens.next().ok_or(ProtocolError::EmptyCommandLine)?;

        Ok(Self {
            verb: verb.to_ascii_uppercase(),
            args: tokens.map(str::to_string).collect(),
        })
    }

    /// Build a command from a verb and arguments
    ///
    /// The verb is uppercased; an empty verb is rejected to uphold the
    /// non-empty-verb invariant that [`parse`](Self::parse) guarantees.
    pub fn new(
        verb: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, ProtocolError> {
        let verb: String = verb.into();
        if verb.trim().is_empty() {
            return Err(ProtocolError::EmptyCommandLine);
        }

        Ok(Self {
            verb: verb.to_ascii_uppercase(),
            args: args.into_iter().map(Into::into).collect(),
        })
    }

    /// The command verb, always uppercase and non-empty
    #[inline]
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// The argument tokens in order
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Serialize to wire form: verb, space-joined arguments, CRLF
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let args_len: usize = self.args.iter().map(|a| a.len() + 1).sum();
        let mut out = Vec::with_capacity(self.verb.len() + args_len + wire::CRLF.len());

        out.extend_from_slice(self.verb.as_bytes());
        for arg in &self.args {
            out.push(b' ');
            out.extend_from_slice(arg.as_bytes());
        }
        out.extend_from_slice(wire::CRLF);
        out
    }

    /// Whether this command ends the control session (QUIT)
    #[inline]
    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.verb == "QUIT"
    }
}

impl std::fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.verb)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verb_only() {
        let cmd = FtpCommand::parse("NOOP").unwrap();
        assert_eq!(cmd.verb(), "NOOP");
        assert!(cmd.args().is_empty());
    }

    #[test]
    fn test_parse_verb_and_args() {
        let cmd = FtpCommand::parse("RETR pub/archive.tar.gz").unwrap();
        assert_eq!(cmd.verb(), "RETR");
        assert_eq!(cmd.args(), ["pub/archive.tar.gz"]);
    }

    #[test]
    fn test_parse_multiple_args() {
        let cmd = FtpCommand::parse("PORT 127,0,0,1,200,10").unwrap();
        assert_eq!(cmd.verb(), "PORT");
        assert_eq!(cmd.args(), ["127,0,0,1,200,10"]);

        let cmd = FtpCommand::parse("SITE CHMOD 644 file.txt").unwrap();
        assert_eq!(cmd.verb(), "SITE");
        assert_eq!(cmd.args(), ["CHMOD", "644", "file.txt"]);
    }

    #[test]
    fn test_parse_normalizes_verb_case() {
        for input in ["quit", "Quit", "QUIT", "qUiT"] {
            let cmd = FtpCommand::parse(input).unwrap();
            assert_eq!(cmd.verb(), "QUIT");
            assert!(cmd.is_quit());
        }
    }

    #[test]
    fn test_parse_preserves_arg_case() {
        let cmd = FtpCommand::parse("user Anonymous").unwrap();
        assert_eq!(cmd.verb(), "USER");
        assert_eq!(cmd.args(), ["Anonymous"]);
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let cmd = FtpCommand::parse("  CWD   /pub/mirrors  ").unwrap();
        assert_eq!(cmd.verb(), "CWD");
        assert_eq!(cmd.args(), ["/pub/mirrors"]);
    }

    #[test]
    fn test_parse_empty_line_fails() {
        assert_eq!(
            FtpCommand::parse(""),
            Err(ProtocolError::EmptyCommandLine)
        );
        assert_eq!(
            FtpCommand::parse("   "),
            Err(ProtocolError::EmptyCommandLine)
        );
    }

    #[test]
    fn test_new_rejects_empty_verb() {
        assert!(FtpCommand::new("", Vec::<String>::new()).is_err());
        assert!(FtpCommand::new("  ", Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_to_wire_verb_only() {
        let cmd = FtpCommand::new("NOOP", Vec::<String>::new()).unwrap();
        assert_eq!(cmd.to_wire(), b"NOOP\r\n");
    }

    #[test]
    fn test_to_wire_with_args() {
        let cmd = FtpCommand::new("FOO", ["bar"]).unwrap();
        assert_eq!(cmd.to_wire(), b"FOO bar\r\n");

        let cmd = FtpCommand::new("SITE", ["CHMOD", "644", "x"]).unwrap();
        assert_eq!(cmd.to_wire(), b"SITE CHMOD 644 x\r\n");
    }

    #[test]
    fn test_round_trip() {
        for input in ["NOOP", "USER anonymous", "SITE CHMOD 644 file.txt"] {
            let cmd = FtpCommand::parse(input).unwrap();
            let wire = cmd.to_wire();
            let reparsed =
                FtpCommand::parse(std::str::from_utf8(&wire).unwrap().trim_end()).unwrap();
            assert_eq!(cmd, reparsed);
        }
    }

    #[test]
    fn test_display() {
        let cmd = FtpCommand::parse("retr  pub/file").unwrap();
        assert_eq!(format!("{}", cmd), "RETR pub/file");
    }
}
