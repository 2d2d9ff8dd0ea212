//! The reactor event loop.
//!
//! Responsibilities:
//! - Own the listening socket, the poller, and all per-connection state
//! - Wait for readiness, then dispatch each event to the accept or read path
//! - Funnel every connection exit (response written, peer gone, error)
//!   through a single close path so bookkeeping and kernel interest never
//!   diverge
//! - Poll the shutdown flag once per iteration and return cleanly when set
//!
//! Everything runs on the calling thread. The only suspension point is the
//! poller's wait call; events from one wait are handled strictly in order
//! before the next wait begins.

use super::conn::Connection;
use super::event::Event;
use super::poller::Poller;
use super::poller::common::Interest;
use super::poller::platform::{sys_read, sys_write};
use crate::config::Config;
use crate::http;
use crate::net::Listener;
use crate::shutdown;

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Bytes read from a connection socket per read call.
const READ_CHUNK: usize = 4096;

/// Upper bound on buffered request bytes. A connection that crosses it
/// without producing a header terminator is answered with `400` and closed,
/// which also bounds memory per connection.
const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Default bound on a single wait, so an idle process still notices a
/// shutdown request promptly.
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// The event loop: accepts connections, accumulates their requests, and
/// answers each with one fixed JSON response.
///
/// The map of live connections mirrors the poller's interest set at all
/// times. Dropping the reactor releases everything it owns: the listening
/// socket, the poller, and every connection descriptor.
pub struct Reactor {
    listener: Listener,
    poller: Poller,

    connections: HashMap<RawFd, Connection>,
    events: Vec<Event>,

    poll_timeout: Option<Duration>,
}

impl Reactor {
    /// Performs all fatal setup: binds the listening socket, creates the
    /// poller, and registers the listener for readability.
    ///
    /// Any failure here means the server cannot serve at all, so the error
    /// propagates instead of being absorbed.
    pub fn bind(config: &Config) -> io::Result<Self> {
        let listener = Listener::bind(&config.addr(), config.backlog)?;
        let poller = Poller::new()?;

        poller.register(
            listener.as_raw_fd(),
            Interest {
                read: true,
                peer_hangup: false,
            },
        )?;

        let addr = listener.local_addr()?;
        info!("Listening on http://{addr}");

        Ok(Self {
            listener,
            poller,
            connections: HashMap::new(),
            events: Vec::with_capacity(128),
            poll_timeout: Some(DEFAULT_POLL_TIMEOUT),
        })
    }

    /// The address the listener actually bound, with the real port when an
    /// ephemeral one was requested.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Bounds each wait call. `None` blocks until readiness or a signal,
    /// which delays shutdown observation on an idle server accordingly.
    pub fn set_poll_timeout(&mut self, timeout: Option<Duration>) {
        self.poll_timeout = timeout;
    }

    /// Runs the event loop until a shutdown is requested.
    ///
    /// A signal interrupting the wait restarts the iteration, which is what
    /// makes a flag set from a handler visible without delay. Any other
    /// wait failure is fatal: the loop cannot make progress without its
    /// readiness source.
    pub fn run(&mut self) -> io::Result<()> {
        while !shutdown::requested() {
            match self.poller.wait(&mut self.events, self.poll_timeout) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }

            let events: Vec<Event> = self.events.drain(..).collect();
            for event in events {
                if event.fd == self.listener.as_raw_fd() {
                    self.accept_ready();
                } else {
                    self.connection_ready(event);
                }
            }
        }

        info!("shutting down");
        Ok(())
    }

    /// Drains the accept backlog for one listener readiness notification.
    ///
    /// Accepting until `WouldBlock` means one notification admits every
    /// connection already queued, not just the first. Running out of
    /// descriptors stops this round but leaves the loop alive; the backlog
    /// is retried once readiness is reported again.
    fn accept_ready(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((fd, peer)) => self.admit(fd, peer),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    match err.raw_os_error() {
                        Some(libc::EMFILE) | Some(libc::ENFILE) => {
                            warn!("accept deferred, descriptor limit reached: {err}");
                        }
                        _ => error!("accept failed: {err}"),
                    }
                    break;
                }
            }
        }
    }

    /// Registers a freshly accepted descriptor and starts tracking it.
    ///
    /// On registration failure the `Connection` is simply dropped, which
    /// closes the descriptor; nothing else references it yet.
    fn admit(&mut self, fd: RawFd, peer: Option<SocketAddr>) {
        let conn = Connection::new(fd, peer);

        let interest = Interest {
            read: true,
            peer_hangup: true,
        };

        if let Err(err) = self.poller.register(fd, interest) {
            warn!("connection {fd}: registration failed: {err}");
            return;
        }

        debug!("connection {fd} accepted from {}", conn.remote());
        self.connections.insert(fd, conn);
    }

    /// Advances one connection on a readiness notification.
    fn connection_ready(&mut self, event: Event) {
        // A connection closed earlier in this batch can still have an
        // event queued; there is nothing left to do for it.
        let Some(conn) = self.connections.get_mut(&event.fd) else {
            return;
        };

        let outcome = if event.readable {
            drive_read(conn)
        } else {
            // Nothing to read; only a hangup could have produced the
            // notification.
            ReadOutcome::Pending
        };
        let remote = conn.remote();

        match outcome {
            ReadOutcome::Pending => {
                // More data may arrive later; the buffered bytes stay put.
                // Unless the peer already hung up, in which case it never
                // will and the connection is done.
                if event.hangup {
                    debug!("connection {} from {remote}: peer hung up mid-request", event.fd);
                    self.close_connection(event.fd);
                }
            }
            ReadOutcome::Complete => {
                respond(event.fd, 200, &http::greeting_body(&remote));
                self.close_connection(event.fd);
            }
            ReadOutcome::TooLarge => {
                warn!(
                    "connection {} from {remote}: no header terminator within {MAX_REQUEST_BYTES} bytes",
                    event.fd
                );
                drain_residual(event.fd);
                respond(event.fd, 400, &http::rejection_body(&remote));
                self.close_connection(event.fd);
            }
            ReadOutcome::PeerClosed => {
                debug!("connection {} from {remote}: peer closed before completing a request", event.fd);
                self.close_connection(event.fd);
            }
            ReadOutcome::Failed(err) => {
                warn!("connection {} from {remote}: read failed: {err}", event.fd);
                self.close_connection(event.fd);
            }
        }
    }

    /// The single close path for connections.
    ///
    /// Deregisters first, then drops the map entry, whose `Drop` closes the
    /// descriptor. Doing it in this order keeps the poller's interest set
    /// free of descriptors the reactor no longer tracks.
    fn close_connection(&mut self, fd: RawFd) {
        if let Err(err) = self.poller.deregister(fd) {
            debug!("connection {fd}: deregistration failed: {err}");
        }

        self.connections.remove(&fd);
    }
}

/// What a round of reading produced for one connection.
enum ReadOutcome {
    /// No complete request yet; keep the connection registered.
    Pending,
    /// A full request head is buffered.
    Complete,
    /// The buffer limit was hit before the terminator arrived.
    TooLarge,
    /// The peer closed before completing a request.
    PeerClosed,
    /// The socket reported a hard error.
    Failed(io::Error),
}

/// Reads available bytes into the connection's buffer.
///
/// Stops at the first of: header terminator buffered, buffer limit
/// exceeded, no more data for now, end of stream, or a hard error. Bytes
/// past the terminator are left unread; the connection is about to be
/// closed, so they have nowhere to go.
fn drive_read(conn: &mut Connection) -> ReadOutcome {
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = sys_read(conn.fd(), &mut chunk);

        if n > 0 {
            conn.push(&chunk[..n as usize]);

            if conn.headers_complete() {
                return ReadOutcome::Complete;
            }

            if conn.len() > MAX_REQUEST_BYTES {
                return ReadOutcome::TooLarge;
            }
        } else if n == 0 {
            return ReadOutcome::PeerClosed;
        } else {
            let err = io::Error::last_os_error();

            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock => return ReadOutcome::Pending,
                _ => return ReadOutcome::Failed(err),
            }
        }
    }
}

/// Discards bytes the peer sent past the buffer limit, up to one further
/// limit's worth.
///
/// Closing with unread bytes in the receive queue makes the kernel reset
/// the connection, and the reset can overtake the rejection response. A
/// peer that stopped sending gets drained completely and receives its
/// `400`; one that keeps flooding hits the bound and loses the response
/// to the reset.
fn drain_residual(fd: RawFd) {
    let mut chunk = [0u8; READ_CHUNK];
    let mut budget = MAX_REQUEST_BYTES;

    while budget > 0 {
        let n = sys_read(fd, &mut chunk);

        if n > 0 {
            budget = budget.saturating_sub(n as usize);
        } else if n == 0 {
            break;
        } else {
            let err = io::Error::last_os_error();

            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }

            break;
        }
    }
}

/// Formats and writes one response.
///
/// A failed write costs the peer its response, never the loop its
/// liveness; it is logged and the caller closes the connection either way.
fn respond(fd: RawFd, status: u16, body: &[u8]) {
    let response = http::format_response(status, body);

    if let Err(err) = write_full(fd, &response) {
        warn!("connection {fd}: response write failed: {err}");
    }
}

/// Writes the whole buffer, retrying on signal interruption.
///
/// `WouldBlock` is an error here: the responses are small enough for an
/// empty socket buffer, and a peer too slow to take one is closed rather
/// than waited on.
fn write_full(fd: RawFd, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        let n = sys_write(fd, data);

        if n > 0 {
            data = &data[n as usize..];
        } else if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "write returned zero bytes",
            ));
        } else {
            let err = io::Error::last_os_error();

            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }

            return Err(err);
        }
    }

    Ok(())
}
