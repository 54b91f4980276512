//! Centralized constants for the FTP proxy
//!
//! Grouped by concern so call sites read as `wire::MAX_LINE_LEN` or
//! `buffer::RELAY` rather than bare numbers.

/// FTP control-channel wire format constants
pub mod wire {
    /// Line terminator for the control channel (RFC 959 uses Telnet EOL)
    pub const CRLF: &[u8] = b"\r\n";

    /// Reply codes are exactly three ASCII digits
    pub const REPLY_CODE_LEN: usize = 3;

    /// Separator marking the final line of a reply
    pub const SEPARATOR_FINAL: u8 = b' ';

    /// Separator marking a continuation line (more reply lines follow)
    pub const SEPARATOR_CONTINUATION: u8 = b'-';

    /// Maximum accepted control line length, including CRLF
    ///
    /// RFC 959 suggests 512 octets for command lines; server replies
    /// (banners especially) can run longer, so the limit is generous
    /// without being unbounded.
    pub const MAX_LINE_LEN: usize = 1024;

    /// Maximum number of lines accepted for one multi-line reply
    ///
    /// Bounds memory against a broken or hostile server that opens a
    /// `DDD-` reply and never terminates it.
    pub const MAX_REPLY_LINES: usize = 64;
}

/// Buffer sizing for the byte relay
pub mod buffer {
    /// Size of each relay buffer in bytes
    ///
    /// Control-channel traffic is small; one buffer comfortably holds
    /// many pipelined command or reply lines.
    pub const RELAY: usize = 16 * 1024;

    /// Number of relay buffers pre-allocated per pool
    pub const POOL_COUNT: usize = 32;
}

/// Timeouts and pacing
pub mod timeout {
    /// Bound on a single relay round's readiness wait, in milliseconds
    ///
    /// The relay is invoked repeatedly from an outer loop; this bound only
    /// guarantees the round returns so the caller regains control.
    pub const RELAY_ROUND_MS: u64 = 500;

    /// Backend TCP connect timeout, in seconds
    pub const CONNECT_SECS: u64 = 10;
}
