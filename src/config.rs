//! Configuration module
//!
//! This module handles all configuration types and loading for the FTP
//! proxy: the listen address, the backend server, and relay tuning.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::{buffer, timeout, wire};
use crate::relay::RelayFlags;

/// Default listen host
fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

/// Default listen port
fn default_listen_port() -> u16 {
    2121
}

/// Default backend FTP control port
fn default_server_port() -> u16 {
    21
}

/// Default bound on a relay round's readiness wait, in milliseconds
fn default_round_timeout_ms() -> u64 {
    timeout::RELAY_ROUND_MS
}

/// Default relay buffer size in bytes
fn default_buffer_size() -> usize {
    buffer::RELAY
}

/// Default relay buffer pool count
fn default_buffer_count() -> usize {
    buffer::POOL_COUNT
}

/// Default maximum control line length
fn default_max_line_len() -> usize {
    wire::MAX_LINE_LEN
}

/// Default EOF policy: a closing peer ends the session normally
fn default_ignore_eof() -> bool {
    true
}

/// Main proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// Client-facing listener
    #[serde(default)]
    pub listen: ListenConfig,
    /// Backend FTP server
    #[serde(default)]
    pub server: ServerConfig,
    /// Relay tuning
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Client-facing listener address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenConfig {
    #[serde(default = "default_listen_host")]
    pub host: String,
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_listen_host(),
            port: default_listen_port(),
        }
    }
}

impl ListenConfig {
    /// Formatted bind address, e.g. `0.0.0.0:2121`
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Backend FTP server to proxy toward
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_listen_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Optional display name for logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: default_server_port(),
            name: None,
        }
    }
}

impl ServerConfig {
    /// Formatted connect address, e.g. `127.0.0.1:21`
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Display name for logs, falling back to the address
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.addr())
    }
}

/// Relay tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    /// Bound on a single relay round's readiness wait, in milliseconds
    #[serde(default = "default_round_timeout_ms")]
    pub round_timeout_ms: u64,
    /// Size of each relay buffer in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Number of relay buffers pre-allocated per pool
    #[serde(default = "default_buffer_count")]
    pub buffer_count: usize,
    /// Maximum accepted control line length
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    /// Whether a peer closing its connection ends the session normally
    /// (rather than being reported as an error)
    #[serde(default = "default_ignore_eof")]
    pub ignore_eof: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            round_timeout_ms: default_round_timeout_ms(),
            buffer_size: default_buffer_size(),
            buffer_count: default_buffer_count(),
            max_line_len: default_max_line_len(),
            ignore_eof: default_ignore_eof(),
        }
    }
}

impl RelayConfig {
    /// The round bound as a [`Duration`]
    #[must_use]
    pub fn round_timeout(&self) -> Duration {
        Duration::from_millis(self.round_timeout_ms)
    }

    /// The relay flags this configuration implies
    #[must_use]
    pub fn flags(&self) -> RelayFlags {
        RelayFlags {
            ignore_eof: self.ignore_eof,
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Write a default configuration file and return it
pub fn create_default_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config = Config::default();
    let contents =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen.addr(), "0.0.0.0:2121");
        assert_eq!(config.server.addr(), "127.0.0.1:21");
        assert_eq!(config.relay.round_timeout(), Duration::from_millis(500));
        assert!(config.relay.flags().ignore_eof);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "ftp.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "ftp.example.com");
        assert_eq!(config.server.port, 21);
        assert_eq!(config.listen.port, 2121);
    }

    #[test]
    fn test_parse_full_toml() {
        let config: Config = toml::from_str(
            r#"
            [listen]
            host = "127.0.0.1"
            port = 8021

            [server]
            host = "10.0.0.5"
            port = 2100
            name = "archive"

            [relay]
            round_timeout_ms = 250
            buffer_size = 8192
            buffer_count = 8
            max_line_len = 512
            ignore_eof = false
            "#,
        )
        .unwrap();
        assert_eq!(config.listen.addr(), "127.0.0.1:8021");
        assert_eq!(config.server.display_name(), "archive");
        assert_eq!(config.relay.round_timeout(), Duration::from_millis(250));
        assert_eq!(config.relay.buffer_size, 8192);
        assert!(!config.relay.flags().ignore_eof);
    }

    #[test]
    fn test_display_name_falls_back_to_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.display_name(), "127.0.0.1:21");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nhost = \"ftp.example.com\"\nport = 21").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.host, "ftp.example.com");
    }

    #[test]
    fn test_load_missing_file_fails_with_context() {
        let err = load_config("/nonexistent/ftp-proxy.toml").unwrap_err();
        assert!(err.to_string().contains("ftp-proxy.toml"));
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [[").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_create_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let written = create_default_config(&path).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(written, loaded);
    }
}
