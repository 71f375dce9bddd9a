//! Session configuration.
//!
//! All defaults are applied here, at the parse boundary. Once a
//! [`SessionConfig`] exists its values are used as-is by the session.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use fuzz_wire::{DEFAULT_PPID, DEFAULT_STREAM_ID};

use crate::error::ConfigError;

/// Default blocking I/O timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default receive buffer size in bytes
pub const DEFAULT_RECV_BUFFER: usize = 4096;

/// Default connect retry count
pub const DEFAULT_RETRY: u32 = 3;

/// Configuration for a fuzz session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Destination address literal
    pub target_host: String,
    /// Destination port
    pub target_port: u16,
    /// Bind address literal, empty for the wildcard address
    #[serde(default)]
    pub source_host: String,
    /// Bind port; no bind happens without one
    #[serde(default)]
    pub source_port: Option<u16>,
    /// Blocking I/O timeout, float seconds in configuration files
    #[serde(default = "default_timeout", with = "float_seconds")]
    pub timeout: Duration,
    /// Receive buffer size in bytes
    #[serde(default = "default_recv_buffer")]
    pub recv_buffer: usize,
    /// Reopen silently when a send fails
    #[serde(default = "default_true")]
    pub auto_reopen: bool,
    /// Server role: accept a peer and receive from it
    #[serde(default)]
    pub server: bool,
    /// Whether the caller should read before its first send (defaults to `server`)
    #[serde(default)]
    pub read_first: Option<bool>,
    /// Attempts for the initial open
    #[serde(default = "default_retry")]
    pub retry: u32,
    /// Default outbound stream id
    #[serde(default = "default_stream_id", rename = "streamid", alias = "stream_id")]
    pub stream_id: u16,
    /// Default outbound payload protocol id
    #[serde(default = "default_ppid")]
    pub ppid: u32,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_recv_buffer() -> usize {
    DEFAULT_RECV_BUFFER
}

fn default_true() -> bool {
    true
}

fn default_retry() -> u32 {
    DEFAULT_RETRY
}

fn default_stream_id() -> u16 {
    DEFAULT_STREAM_ID
}

fn default_ppid() -> u32 {
    DEFAULT_PPID
}

impl SessionConfig {
    /// Create a configuration with every optional key at its default
    pub fn new(target_host: impl Into<String>, target_port: u16) -> Self {
        Self {
            target_host: target_host.into(),
            target_port,
            source_host: String::new(),
            source_port: None,
            timeout: DEFAULT_TIMEOUT,
            recv_buffer: DEFAULT_RECV_BUFFER,
            auto_reopen: true,
            server: false,
            read_first: None,
            retry: DEFAULT_RETRY,
            stream_id: DEFAULT_STREAM_ID,
            ppid: DEFAULT_PPID,
        }
    }

    /// Effective read-first hint
    pub fn read_first(&self) -> bool {
        self.read_first.unwrap_or(self.server)
    }

    /// Check the value constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_host.is_empty() {
            return Err(ConfigError::Missing("target_host"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid(
                "timeout",
                self.timeout.as_secs_f64(),
                "must be positive",
            ));
        }
        if self.recv_buffer == 0 {
            return Err(ConfigError::invalid("recv_buffer", 0, "must be positive"));
        }
        Ok(())
    }

    /// Build from an INI-style section of string keys and values.
    ///
    /// Unknown keys are ignored. Booleans accept `1/yes/true/on` and
    /// `0/no/false/off`, case-insensitively.
    pub fn from_section<'a, I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let section: HashMap<&str, &str> = entries
            .into_iter()
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();

        let target_host = section
            .get("target_host")
            .ok_or(ConfigError::Missing("target_host"))?
            .to_string();
        let target_port =
            parse_value::<u16>(&section, "target_port")?.ok_or(ConfigError::Missing("target_port"))?;

        let mut config = Self::new(target_host, target_port);

        if let Some(source_host) = section.get("source_host") {
            config.source_host = source_host.to_string();
        }
        config.source_port = parse_value(&section, "source_port")?;
        if let Some(secs) = parse_value::<f64>(&section, "timeout")? {
            config.timeout = seconds_to_duration(secs)
                .map_err(|reason| ConfigError::invalid("timeout", secs, reason))?;
        }
        if let Some(size) = parse_value(&section, "recv_buffer")? {
            config.recv_buffer = size;
        }
        if let Some(flag) = parse_bool(&section, "auto_reopen")? {
            config.auto_reopen = flag;
        }
        if let Some(flag) = parse_bool(&section, "server")? {
            config.server = flag;
        }
        config.read_first = parse_bool(&section, "read_first")?;
        if let Some(retry) = parse_value(&section, "retry")? {
            config.retry = retry;
        }
        if let Some(stream_id) = parse_value(&section, "streamid")? {
            config.stream_id = stream_id;
        }
        if let Some(ppid) = parse_value(&section, "ppid")? {
            config.ppid = ppid;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_value<T>(section: &HashMap<&str, &str>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, raw, e)),
    }
}

fn parse_bool(section: &HashMap<&str, &str>, key: &str) -> Result<Option<bool>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(Some(true)),
            "0" | "no" | "false" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::invalid(key, raw, "not a boolean")),
        },
    }
}

fn seconds_to_duration(secs: f64) -> Result<Duration, &'static str> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err("must be a positive number of seconds");
    }
    Duration::try_from_secs_f64(secs).map_err(|_| "out of range")
}

/// Serde adapter for durations written as float seconds
mod float_seconds {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        super::seconds_to_duration(secs).map_err(de::Error::custom)
    }
}
