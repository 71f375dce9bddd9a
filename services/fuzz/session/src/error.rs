//! Session error types.

use std::io;
use std::net::AddrParseError;
use thiserror::Error;

/// Errors raised while building a session from its configuration.
///
/// These are terminal: a configuration that fails here never produces a
/// session, so there is nothing to retry.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required key is absent
    #[error("missing required key '{0}'")]
    Missing(&'static str),

    /// A value does not parse or is out of range for its key
    #[error("invalid value '{value}' for '{key}': {reason}")]
    Invalid {
        /// Configuration key
        key: String,
        /// Raw value as given
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Neither an IPv4 nor an IPv6 literal
    #[error("unknown address family: {addr}: {v4_error}, {v6_error}")]
    UnknownFamily {
        /// Offending address string
        addr: String,
        /// Error from the IPv4 attempt
        v4_error: AddrParseError,
        /// Error from the IPv6 attempt
        v6_error: AddrParseError,
    },

    /// Source and target resolve to different families
    #[error("address family mismatch: {target_host} - {source_host}")]
    FamilyMismatch {
        /// Destination address
        target_host: String,
        /// Bind address
        source_host: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: impl ToString, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by session lifecycle and send operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// Endpoint creation, configuration or bind failed
    #[error("cannot open session: {0}")]
    Open(#[source] io::Error),

    /// Transmit failed with auto-reopen disabled; the session is closed
    #[error("error on sending '{0}', connection closed")]
    Send(#[source] io::Error),

    /// `open` called on a session that is already open
    #[error("session already open")]
    AlreadyOpen,
}

impl SessionError {
    /// Underlying I/O error, if any
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            SessionError::Open(e) | SessionError::Send(e) => Some(e),
            SessionError::AlreadyOpen => None,
        }
    }
}
