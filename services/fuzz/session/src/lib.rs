//! SCTP endpoint lifecycle, truncating send and auto-reopen for fuzz sessions.
//!
//! This crate owns the transport side of a fuzzing run: it validates the
//! target configuration, opens SCTP endpoints with the fuzzer's socket
//! options, clamps outgoing messages to what the kernel will accept and
//! recovers from dropped associations.
//!
//! ## Features
//!
//! - **Configuration**: YAML/serde or INI-style sections, with validation
//! - **Address handling**: IPv4/IPv6 detection and family matching
//! - **Client and server roles**: one-to-many client, accept-one server
//! - **Truncating send**: payloads clamped to the negotiated send buffer
//! - **Auto-reopen**: transmit failures close and reopen the session
//!
//! ## Example
//!
//! ```rust,no_run
//! use fuzz_session::{Session, SessionConfig};
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut config = SessionConfig::new("192.0.2.10", 2905);
//! config.ppid = 3; // M3UA
//!
//! let mut session = Session::sctp(config)?;
//! session.open()?;
//!
//! session.send(b"\x01\x00\x03\x01\x00\x00\x00\x08", None)?;
//! // same message on stream 2
//! session.send(b"\x01\x00\x03\x01\x00\x00\x00\x08", Some(2))?;
//!
//! match session.recv() {
//!     Ok(reply) => println!("{} byte reply", reply.len()),
//!     Err(e) => println!("no reply: {}", e),
//! }
//!
//! session.close();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod log;
pub mod sctp;
pub mod session;

#[cfg(test)]
mod mock;

// Re-export main types
pub use address::{resolve, resolve_pair, AddressFamily};
pub use config::{SessionConfig, DEFAULT_RECV_BUFFER, DEFAULT_RETRY, DEFAULT_TIMEOUT};
pub use endpoint::{Connector, Endpoint, Role};
pub use error::{ConfigError, SessionError};
pub use log::{LogSink, TracingSink};
pub use sctp::{SctpConnector, SctpEndpoint};
pub use session::{Session, SessionStats};
