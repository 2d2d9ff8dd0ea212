//! Readiness events reported by the poller.

use std::os::fd::RawFd;

/// A single readiness notification for one descriptor.
///
/// Produced by the poller's wait call and consumed by the reactor's
/// dispatch loop. The descriptor doubles as the event token, so no
/// separate lookup table is needed to map events back to connections.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Event {
    /// The descriptor the kernel reported on.
    pub(crate) fd: RawFd,

    /// Data (or an accepted connection) can be read without blocking.
    ///
    /// Error and hangup conditions are folded in here as well: a read on
    /// such a descriptor returns promptly with `0` or an error, which is
    /// exactly how the reactor wants to discover them.
    pub(crate) readable: bool,

    /// The peer closed its end of the connection.
    pub(crate) hangup: bool,
}
