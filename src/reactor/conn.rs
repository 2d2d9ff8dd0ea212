//! Per-connection state.
//!
//! Responsibilities:
//! - Own the connection's descriptor and close it exactly once on drop
//! - Accumulate request bytes across wait cycles until the header
//!   terminator arrives
//! - Remember the peer address captured at accept time for logging and
//!   response bodies

use crate::reactor::poller::platform::sys_close;

use std::net::SocketAddr;
use std::os::fd::RawFd;

/// End-of-headers marker for an HTTP/1.1 request.
const TERMINATOR: &[u8] = b"\r\n\r\n";

/// State for one accepted connection.
///
/// A connection may need several wait cycles to deliver its full request,
/// so the buffer lives here rather than in the read loop. Dropping the
/// connection closes the descriptor; the reactor deregisters from the
/// poller first so kernel interest and its own bookkeeping never diverge.
pub(crate) struct Connection {
    /// The connection's descriptor, owned until drop.
    fd: RawFd,

    /// Peer address captured at accept time, if the kernel reported a
    /// family we understand.
    peer: Option<SocketAddr>,

    /// Request bytes received so far.
    buf: Vec<u8>,

    /// Whether the header terminator has been seen. Latches true.
    saw_terminator: bool,
}

impl Connection {
    pub(crate) fn new(fd: RawFd, peer: Option<SocketAddr>) -> Self {
        Self {
            fd,
            peer,
            buf: Vec::new(),
            saw_terminator: false,
        }
    }

    pub(crate) fn fd(&self) -> RawFd {
        self.fd
    }

    /// Appends freshly read bytes and rescans for the header terminator.
    ///
    /// The terminator can straddle two reads, so the scan backs up three
    /// bytes into previously buffered data instead of starting at the new
    /// chunk's first byte.
    pub(crate) fn push(&mut self, chunk: &[u8]) {
        let rescan_from = self.buf.len().saturating_sub(TERMINATOR.len() - 1);
        self.buf.extend_from_slice(chunk);

        if !self.saw_terminator {
            self.saw_terminator = self.buf[rescan_from..]
                .windows(TERMINATOR.len())
                .any(|window| window == TERMINATOR);
        }
    }

    /// Whether a complete request head has been buffered.
    pub(crate) fn headers_complete(&self) -> bool {
        self.saw_terminator
    }

    /// Number of request bytes buffered so far.
    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    /// The peer address as text, or `"?"` when it could not be determined.
    pub(crate) fn remote(&self) -> String {
        match self.peer {
            Some(addr) => addr.to_string(),
            None => String::from("?"),
        }
    }
}

impl Drop for Connection {
    /// Closes the connection's descriptor.
    fn drop(&mut self) {
        sys_close(self.fd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A descriptor no test asserts on; `close` on it failing is harmless.
    const DUMMY_FD: RawFd = -1;

    #[test]
    fn test_terminator_in_single_push() {
        let mut conn = Connection::new(DUMMY_FD, None);

        conn.push(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");

        assert!(conn.headers_complete());
    }

    #[test]
    fn test_terminator_split_across_pushes() {
        let mut conn = Connection::new(DUMMY_FD, None);

        conn.push(b"GET / HTTP/1.1\r");
        assert!(!conn.headers_complete());

        conn.push(b"\n");
        assert!(!conn.headers_complete());

        conn.push(b"\r\n");
        assert!(conn.headers_complete());
    }

    #[test]
    fn test_terminator_latches() {
        let mut conn = Connection::new(DUMMY_FD, None);

        conn.push(b"HEAD / HTTP/1.1\r\n\r\n");
        assert!(conn.headers_complete());

        conn.push(b"trailing garbage");
        assert!(conn.headers_complete());
    }

    #[test]
    fn test_incomplete_request_stays_pending() {
        let mut conn = Connection::new(DUMMY_FD, None);

        conn.push(b"GET / HTTP/1.1\r\nHost: ");
        conn.push(b"localhost");

        assert!(!conn.headers_complete());
        assert_eq!(conn.len(), b"GET / HTTP/1.1\r\nHost: localhost".len());
    }

    #[test]
    fn test_remote_formats_known_peer() {
        let peer: SocketAddr = "127.0.0.1:45678".parse().expect("Failed to parse address");
        let conn = Connection::new(DUMMY_FD, Some(peer));

        assert_eq!(conn.remote(), "127.0.0.1:45678");
    }

    #[test]
    fn test_remote_falls_back_when_unknown() {
        let conn = Connection::new(DUMMY_FD, None);

        assert_eq!(conn.remote(), "?");
    }
}
