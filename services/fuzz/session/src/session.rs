//! Core fuzz session.
//!
//! A [`Session`] owns the endpoint slot for one SCTP association target and
//! exposes blocking `open`/`close`/`send`/`recv`. The slot holds the primary
//! endpoint and, for server-role sessions, the accepted peer; the session is
//! open exactly when the slot is occupied.

use bytes::{Bytes, BytesMut};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tracing::Level;

use fuzz_wire::{SendDescriptor, MAX_PAYLOAD_SIZE};

use crate::address::{resolve_pair, AddressFamily};
use crate::config::SessionConfig;
use crate::endpoint::{Connector, Endpoint, Role};
use crate::error::{ConfigError, SessionError};
use crate::log::{LogSink, TracingSink};
use crate::sctp::SctpConnector;

/// Statistics for a session
#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    /// Messages handed to the transport
    pub messages_sent: u64,
    /// Bytes handed to the transport
    pub bytes_sent: u64,
    /// Messages cut down to the payload limit
    pub truncated: u64,
    /// Transmit failures, recovered or not
    pub send_failures: u64,
    /// Successful reopens after a transmit failure
    pub reopens: u64,
    /// Messages received
    pub messages_received: u64,
    /// Bytes received
    pub bytes_received: u64,
    /// Timestamp of last successful send
    pub last_send: Option<Instant>,
    /// Timestamp of last successful receive
    pub last_recv: Option<Instant>,
}

struct OpenEndpoints<E> {
    primary: E,
    peer: Option<E>,
}

/// A fuzz session over SCTP
pub struct Session<C: Connector = SctpConnector> {
    config: SessionConfig,
    family: AddressFamily,
    target: SocketAddr,
    source: Option<IpAddr>,
    descriptor: SendDescriptor,
    endpoints: Option<OpenEndpoints<C::Endpoint>>,
    max_payload: usize,
    connector: C,
    sink: Arc<dyn LogSink>,
    stats: SessionStats,
}

impl Session<SctpConnector> {
    /// Session on kernel SCTP sockets, logging through `tracing`
    pub fn sctp(config: SessionConfig) -> Result<Self, ConfigError> {
        Self::new(config, SctpConnector, Arc::new(TracingSink))
    }
}

impl<C: Connector> Session<C> {
    /// Validate the configuration and resolve addresses.
    ///
    /// Never touches the network; endpoints are created by [`Session::open`].
    pub fn new(
        config: SessionConfig,
        connector: C,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (target_ip, source) = resolve_pair(&config.target_host, &config.source_host)?;
        let descriptor = SendDescriptor::new(config.stream_id, config.ppid);

        Ok(Self {
            family: AddressFamily::of(&target_ip),
            target: SocketAddr::new(target_ip, config.target_port),
            source,
            descriptor,
            endpoints: None,
            max_payload: MAX_PAYLOAD_SIZE,
            connector,
            sink,
            stats: SessionStats::default(),
            config,
        })
    }

    /// Configuration snapshot
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Address family of the target
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Resolved destination
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Descriptor used by sends without a stream override
    pub fn default_descriptor(&self) -> SendDescriptor {
        self.descriptor
    }

    /// Largest payload `send` passes through untruncated
    pub fn max_payload_size(&self) -> usize {
        self.max_payload
    }

    /// Whether the caller should read before sending
    pub fn read_first(&self) -> bool {
        self.config.read_first()
    }

    /// Whether endpoints are currently held
    pub fn is_open(&self) -> bool {
        self.endpoints.is_some()
    }

    /// Session statistics
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    fn role(&self) -> Role {
        if self.config.server {
            Role::Server
        } else {
            Role::Client
        }
    }

    fn bind_addr(&self) -> Option<SocketAddr> {
        self.config.source_port.map(|port| {
            let ip = self.source.unwrap_or_else(|| self.family.unspecified());
            SocketAddr::new(ip, port)
        })
    }

    /// Create and configure the endpoint(s).
    ///
    /// On failure the session stays closed and nothing is kept.
    pub fn open(&mut self) -> Result<(), SessionError> {
        if self.endpoints.is_some() {
            return Err(SessionError::AlreadyOpen);
        }

        let endpoints = self.establish().map_err(SessionError::Open)?;
        self.endpoints = Some(endpoints);
        self.sink.log(
            Level::DEBUG,
            &format!(
                "session/sctp: opened {} session to {} (max payload {} bytes)",
                self.family, self.target, self.max_payload
            ),
        );
        Ok(())
    }

    fn establish(&mut self) -> io::Result<OpenEndpoints<C::Endpoint>> {
        let endpoint = self.connector.create(self.family, self.role())?;

        if self.target.ip() == IpAddr::V4(Ipv4Addr::BROADCAST) {
            endpoint.set_broadcast(true)?;
        }
        endpoint.set_reuse_address(true)?;
        endpoint.set_timeout(self.config.timeout)?;

        // Measured once per open; the limit only ever shrinks
        let send_buffer = endpoint.send_buffer_size()?;
        if send_buffer < self.max_payload {
            self.max_payload = send_buffer;
        }

        endpoint.set_default_descriptor(&self.descriptor)?;

        let bind_addr = self.bind_addr();
        if let Some(addr) = bind_addr {
            endpoint.bind(addr)?;
        }

        let peer = match self.role() {
            Role::Client => None,
            Role::Server => {
                if bind_addr.is_none() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "server role requires source_port",
                    ));
                }
                endpoint.listen(1)?;
                let peer = endpoint.accept()?;
                peer.set_timeout(self.config.timeout)?;
                Some(peer)
            }
        };

        Ok(OpenEndpoints {
            primary: endpoint,
            peer,
        })
    }

    /// Open, retrying up to `retry` attempts with `timeout` between them
    pub fn open_with_retry(&mut self) -> Result<(), SessionError> {
        let attempts = self.config.retry.max(1);
        let mut attempt = 1;

        loop {
            match self.open() {
                Ok(()) => return Ok(()),
                Err(SessionError::AlreadyOpen) => return Err(SessionError::AlreadyOpen),
                Err(e) if attempt < attempts => {
                    self.sink.log(
                        Level::WARN,
                        &format!(
                            "session/sctp: open attempt {}/{} failed: {}",
                            attempt, attempts, e
                        ),
                    );
                    std::thread::sleep(self.config.timeout);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Release all endpoints. No-op when already closed.
    pub fn close(&mut self) {
        let Some(endpoints) = self.endpoints.take() else {
            return;
        };

        endpoints.primary.close();
        if let Some(peer) = endpoints.peer {
            peer.close();
        }
    }

    /// Send one message to the target.
    ///
    /// Payloads over the limit are cut to one byte below it. With
    /// auto-reopen a failed transmit drops the message, reopens the session
    /// and returns `Ok`; only a failing reopen is reported. Without it the
    /// session is closed and the failure returned.
    pub fn send(&mut self, data: &[u8], stream_id: Option<u16>) -> Result<(), SessionError> {
        let data = if data.len() > self.max_payload {
            let truncated = &data[..self.max_payload.saturating_sub(1)];
            self.sink.log(
                Level::DEBUG,
                &format!("session/sctp: Truncated data to {} byte.", truncated.len()),
            );
            self.stats.truncated += 1;
            truncated
        } else {
            data
        };

        match self.transmit(data, stream_id) {
            Ok(sent) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += sent as u64;
                self.stats.last_send = Some(Instant::now());
                Ok(())
            }
            Err(e) => {
                self.stats.send_failures += 1;
                if self.config.auto_reopen {
                    self.sink.log(
                        Level::DEBUG,
                        &format!("session/sctp: session got closed '{}', autoreopening...", e),
                    );
                    self.close();
                    self.open()?;
                    self.stats.reopens += 1;
                    Ok(())
                } else {
                    self.close();
                    Err(SessionError::Send(e))
                }
            }
        }
    }

    fn transmit(&self, data: &[u8], stream_id: Option<u16>) -> io::Result<usize> {
        let endpoints = self.endpoints.as_ref().ok_or_else(not_connected)?;

        // The accepted peer is already connected; only the client addresses
        let (endpoint, dest) = match self.role() {
            Role::Server => (endpoints.peer.as_ref().ok_or_else(not_connected)?, None),
            Role::Client => (&endpoints.primary, Some(self.target)),
        };

        match stream_id {
            Some(id) => {
                let descriptor = self.descriptor.with_stream(id);
                endpoint.send_with_descriptor(data, &descriptor, dest)
            }
            None => endpoint.send_to(data, dest),
        }
    }

    /// Receive one message of at most `recv_buffer` bytes.
    ///
    /// Server-role sessions read from the accepted peer. Errors are the
    /// endpoint's own and are not wrapped.
    pub fn recv(&mut self) -> io::Result<Bytes> {
        let endpoints = self.endpoints.as_ref().ok_or_else(not_connected)?;
        let endpoint = match self.role() {
            Role::Server => endpoints.peer.as_ref().ok_or_else(not_connected)?,
            Role::Client => &endpoints.primary,
        };

        let mut buf = BytesMut::zeroed(self.config.recv_buffer);
        let n = endpoint.recv(&mut buf)?;
        buf.truncate(n);

        self.stats.messages_received += 1;
        self.stats.bytes_received += n as u64;
        self.stats.last_recv = Some(Instant::now());
        Ok(buf.freeze())
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "session is not open")
}
