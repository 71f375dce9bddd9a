//! Endpoint seam between the session and the socket layer.
//!
//! The session drives every open step through [`Endpoint`] one call at a
//! time, so the step order lives in the session and the socket layer only
//! performs single operations.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use fuzz_wire::SendDescriptor;

use crate::address::AddressFamily;

/// Which side of the association a session plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends to the target from the primary endpoint
    Client,
    /// Accepts one peer and receives from it
    Server,
}

/// A native communication endpoint
pub trait Endpoint: Sized {
    /// Allow sending to the broadcast address
    fn set_broadcast(&self, enabled: bool) -> io::Result<()>;

    /// Allow quick rebind after close
    fn set_reuse_address(&self, enabled: bool) -> io::Result<()>;

    /// Bound blocking sends and receives
    fn set_timeout(&self, timeout: Duration) -> io::Result<()>;

    /// Current outbound buffer size in bytes
    fn send_buffer_size(&self) -> io::Result<usize>;

    /// Install the descriptor used by plain sends
    fn set_default_descriptor(&self, descriptor: &SendDescriptor) -> io::Result<()>;

    /// Bind to a local address
    fn bind(&self, addr: SocketAddr) -> io::Result<()>;

    /// Start accepting inbound associations
    fn listen(&self, backlog: i32) -> io::Result<()>;

    /// Wait for one inbound association
    fn accept(&self) -> io::Result<Self>;

    /// Send one message using the default descriptor.
    ///
    /// `dest` is `None` on connected endpoints.
    fn send_to(&self, data: &[u8], dest: Option<SocketAddr>) -> io::Result<usize>;

    /// Send one message tagged with an explicit descriptor
    fn send_with_descriptor(
        &self,
        data: &[u8],
        descriptor: &SendDescriptor,
        dest: Option<SocketAddr>,
    ) -> io::Result<usize>;

    /// Receive one message into `buf`
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the endpoint
    fn close(self);
}

/// Creates endpoints for a session
pub trait Connector {
    /// Endpoint type produced
    type Endpoint: Endpoint;

    /// Create an unconfigured endpoint
    fn create(&self, family: AddressFamily, role: Role) -> io::Result<Self::Endpoint>;
}
