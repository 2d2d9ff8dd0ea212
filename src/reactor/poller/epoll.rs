//! Linux `epoll`-based poller.
//!
//! This is the readiness-notification backend of the reactor.
//!
//! Responsibilities:
//! - Track descriptors together with their read/peer-hangup interests
//! - Block the reactor thread until at least one descriptor is ready,
//!   a timeout elapses, or a signal interrupts the wait
//! - Translate kernel events into [`Event`] records keyed by descriptor
//!
//! Registration is **level-triggered** (no `EPOLLET`): readiness is
//! re-reported on every wait for as long as unread data or an unaccepted
//! connection remains, so correctness never depends on draining a
//! descriptor to exhaustion in a single pass. The reactor still drains
//! where it can, to avoid redundant wake-ups.

use super::common::Interest;
use crate::reactor::event::Event;
use crate::reactor::poller::platform::sys_close;

use libc::{
    EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLLERR, EPOLLHUP, EPOLLIN, EPOLLRDHUP,
    epoll_create1, epoll_ctl, epoll_event, epoll_wait,
};
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Maximum number of kernel events collected per wait call.
const EVENT_CAPACITY: usize = 128;

/// Linux `epoll` poller.
///
/// Owns the `epoll` descriptor and a reusable kernel-event buffer. There is
/// no wake-up mechanism: the reactor is the only thread, and the only things
/// that end a wait are readiness, the timeout, and signal interruption.
pub(crate) struct EpollPoller {
    /// Epoll file descriptor.
    epoll: RawFd,

    /// Reusable buffer handed to `epoll_wait`.
    buffer: Vec<epoll_event>,
}

impl EpollPoller {
    /// Creates the epoll instance.
    ///
    /// Failure here is a fatal setup error; a reactor cannot run without
    /// its notification mechanism.
    pub(crate) fn new() -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        let zeroed = epoll_event { events: 0, u64: 0 };

        Ok(Self {
            epoll,
            buffer: vec![zeroed; EVENT_CAPACITY],
        })
    }

    /// Registers a descriptor with the given interests.
    ///
    /// The descriptor itself is used as the event token, so a reported
    /// event maps straight back to the reactor's bookkeeping.
    pub(crate) fn register(&self, fd: RawFd, interest: Interest) -> io::Result<()> {
        let mut flags = 0;

        if interest.read {
            flags |= EPOLLIN;
        }
        if interest.peer_hangup {
            flags |= EPOLLRDHUP;
        }

        let mut event = epoll_event {
            events: flags as u32,
            u64: fd as u64,
        };

        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_ADD, fd, &mut event) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    /// Removes a descriptor from the poller.
    ///
    /// The kernel also drops membership when the descriptor is closed, but
    /// the reactor never relies on that: it deregisters explicitly before
    /// every close, keeping its own bookkeeping and the kernel's interest
    /// set in step.
    pub(crate) fn deregister(&self, fd: RawFd) -> io::Result<()> {
        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_DEL, fd, std::ptr::null_mut()) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    /// Waits for readiness and fills `events` with one record per ready
    /// descriptor.
    ///
    /// `timeout` of `None` blocks until readiness or interruption;
    /// `Some(t)` bounds the wait (rounded down to milliseconds). A signal
    /// arriving during the wait surfaces as `io::ErrorKind::Interrupted`,
    /// which callers must treat as "retry", not as a hard failure.
    pub(crate) fn wait(
        &mut self,
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        let timeout_ms = timeout.map(|t| t.as_millis() as i32).unwrap_or(-1);

        let n = unsafe {
            epoll_wait(
                self.epoll,
                self.buffer.as_mut_ptr(),
                self.buffer.len() as i32,
                timeout_ms,
            )
        };

        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        events.clear();

        for ev in &self.buffer[..n as usize] {
            // Error and hangup conditions are folded into `readable` so the
            // reactor discovers the actual state from the read call itself.
            let readable = ev.events & ((EPOLLIN | EPOLLERR | EPOLLHUP) as u32) != 0;
            let hangup = ev.events & ((EPOLLRDHUP | EPOLLHUP) as u32) != 0;

            events.push(Event {
                fd: ev.u64 as RawFd,
                readable,
                hangup,
            });
        }

        Ok(())
    }
}

impl Drop for EpollPoller {
    /// Closes the epoll descriptor.
    fn drop(&mut self) {
        sys_close(self.epoll);
    }
}
