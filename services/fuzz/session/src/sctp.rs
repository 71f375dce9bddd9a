//! Native SCTP endpoints on top of `socket2`.
//!
//! Client sessions use one-to-many style sockets (`SOCK_SEQPACKET`), which
//! keep message boundaries and need no connect. Server sessions use the
//! one-to-one style (`SOCK_STREAM`) so the kernel can hand out an accepted
//! per-association socket; SCTP keeps message boundaries there as well.

use std::io::{self, IoSlice, Read};
use std::net::SocketAddr;
use std::os::fd::AsRawFd;
use std::time::Duration;

use socket2::{Domain, MsgHdr, Protocol, SockAddr, Socket, Type};

use fuzz_wire::{encode_sndrcv, SendDescriptor, IPPROTO_SCTP, SCTP_DEFAULT_SEND_PARAM, SOL_SCTP};

use crate::address::AddressFamily;
use crate::endpoint::{Connector, Endpoint, Role};

/// Creates kernel SCTP sockets
#[derive(Debug, Clone, Copy, Default)]
pub struct SctpConnector;

impl Connector for SctpConnector {
    type Endpoint = SctpEndpoint;

    fn create(&self, family: AddressFamily, role: Role) -> io::Result<SctpEndpoint> {
        let domain = match family {
            AddressFamily::V4 => Domain::IPV4,
            AddressFamily::V6 => Domain::IPV6,
        };
        let ty = match role {
            Role::Client => Type::SEQPACKET,
            Role::Server => Type::STREAM,
        };

        let socket = Socket::new(domain, ty, Some(Protocol::from(IPPROTO_SCTP)))?;
        Ok(SctpEndpoint { socket })
    }
}

/// A kernel SCTP socket
#[derive(Debug)]
pub struct SctpEndpoint {
    socket: Socket,
}

impl SctpEndpoint {
    /// Local address, once bound
    pub fn local_addr(&self) -> io::Result<Option<SocketAddr>> {
        Ok(self.socket.local_addr()?.as_socket())
    }
}

impl Endpoint for SctpEndpoint {
    fn set_broadcast(&self, enabled: bool) -> io::Result<()> {
        self.socket.set_broadcast(enabled)
    }

    fn set_reuse_address(&self, enabled: bool) -> io::Result<()> {
        self.socket.set_reuse_address(enabled)
    }

    fn set_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.socket.set_read_timeout(Some(timeout))?;
        self.socket.set_write_timeout(Some(timeout))
    }

    fn send_buffer_size(&self) -> io::Result<usize> {
        self.socket.send_buffer_size()
    }

    fn set_default_descriptor(&self, descriptor: &SendDescriptor) -> io::Result<()> {
        let info = descriptor.to_bytes();
        // SAFETY: info is a live buffer of exactly the length passed
        let rc = unsafe {
            libc::setsockopt(
                self.socket.as_raw_fd(),
                SOL_SCTP,
                SCTP_DEFAULT_SEND_PARAM,
                info.as_ptr().cast::<libc::c_void>(),
                info.len() as libc::socklen_t,
            )
        };
        if rc == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn bind(&self, addr: SocketAddr) -> io::Result<()> {
        self.socket.bind(&SockAddr::from(addr))
    }

    fn listen(&self, backlog: i32) -> io::Result<()> {
        self.socket.listen(backlog)
    }

    fn accept(&self) -> io::Result<Self> {
        let (socket, _peer) = self.socket.accept()?;
        Ok(SctpEndpoint { socket })
    }

    fn send_to(&self, data: &[u8], dest: Option<SocketAddr>) -> io::Result<usize> {
        match dest {
            Some(addr) => self.socket.send_to(data, &SockAddr::from(addr)),
            None => self.socket.send(data),
        }
    }

    fn send_with_descriptor(
        &self,
        data: &[u8],
        descriptor: &SendDescriptor,
        dest: Option<SocketAddr>,
    ) -> io::Result<usize> {
        let control = encode_sndrcv(descriptor);
        let addr = dest.map(SockAddr::from);
        let bufs = [IoSlice::new(data)];
        let msg = MsgHdr::new().with_buffers(&bufs).with_control(&control);
        let msg = match &addr {
            Some(addr) => msg.with_addr(addr),
            None => msg,
        };
        self.socket.sendmsg(&msg, 0)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.socket).read(buf)
    }

    fn close(self) {
        drop(self.socket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    // Kernels without the sctp module refuse the socket; skip there.
    fn connector_or_skip() -> Option<SctpEndpoint> {
        match SctpConnector.create(AddressFamily::V4, Role::Client) {
            Ok(endpoint) => Some(endpoint),
            Err(e) => {
                eprintln!("skipping, no kernel SCTP support: {}", e);
                None
            }
        }
    }

    #[test]
    fn test_socket_options() {
        let Some(endpoint) = connector_or_skip() else {
            return;
        };

        endpoint.set_reuse_address(true).unwrap();
        endpoint.set_timeout(Duration::from_millis(100)).unwrap();
        assert!(endpoint.send_buffer_size().unwrap() > 0);
        endpoint
            .set_default_descriptor(&SendDescriptor::new(1, 46))
            .unwrap();
    }

    #[test]
    fn test_loopback_bind() {
        let Some(endpoint) = connector_or_skip() else {
            return;
        };

        endpoint
            .bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .unwrap();
        let local = endpoint.local_addr().unwrap().unwrap();
        assert_eq!(local.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_ne!(local.port(), 0);
        endpoint.close();
    }
}
