use crate::reactor::poller::platform::{
    sys_accept, sys_bind, sys_close, sys_ipv6_is_necessary, sys_listen, sys_parse_sockaddr,
    sys_set_reuseaddr, sys_socket, sys_sockname,
};

use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};

/// A non-blocking TCP listener.
///
/// `Listener` owns the listening socket for the lifetime of the reactor
/// and hands out accepted descriptors one at a time. It never blocks:
/// accepting from an empty backlog returns `WouldBlock` instead of
/// waiting.
pub struct Listener {
    /// File descriptor of the listening socket.
    fd: RawFd,
}

impl Listener {
    /// Binds a listener to the given address.
    ///
    /// The address must be a valid socket address string, such as
    /// `"0.0.0.0:8080"` or `"[::1]:8080"`.
    ///
    /// This function:
    /// - creates a non-blocking socket,
    /// - enables `SO_REUSEADDR`,
    /// - configures IPv6 dual-stack if applicable,
    /// - binds and starts listening with the given backlog.
    pub fn bind(address: &str, backlog: i32) -> io::Result<Self> {
        let (storage, len) = sys_parse_sockaddr(address)?;
        let domain = storage.ss_family as i32;

        // Owning the descriptor from here on means a failure in any of
        // the remaining steps still closes it.
        let listener = Self {
            fd: sys_socket(domain)?,
        };

        sys_set_reuseaddr(listener.fd)?;
        sys_ipv6_is_necessary(listener.fd, domain)?;
        sys_bind(listener.fd, &storage, len)?;
        sys_listen(listener.fd, backlog)?;

        Ok(listener)
    }

    /// Accepts one pending connection.
    ///
    /// Returns the connection's descriptor, already non-blocking, together
    /// with the peer address when the kernel reported an address family we
    /// understand. `WouldBlock` means the backlog is drained.
    pub fn accept(&self) -> io::Result<(RawFd, Option<SocketAddr>)> {
        sys_accept(self.fd)
    }

    /// Returns the local socket address of this listener.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        sys_sockname(self.fd)
    }
}

impl AsRawFd for Listener {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for Listener {
    /// Closes the listening socket.
    fn drop(&mut self) {
        sys_close(self.fd);
    }
}
