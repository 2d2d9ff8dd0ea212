//! Signal-driven shutdown.
//!
//! A process-wide flag set from a signal handler and polled by the
//! reactor once per loop iteration. The handler does nothing but store
//! the flag, the only thing it can safely do; everything orderly (closing
//! sockets, logging) happens on the reactor thread when it notices.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_signal(_signal: i32) {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

/// Installs `SIGINT` and `SIGTERM` handlers that request a shutdown.
///
/// Installed without `SA_RESTART`, so a blocked wait call comes back with
/// `EINTR` and the loop re-polls the flag immediately instead of on its
/// next timeout.
pub fn install() -> io::Result<()> {
    for signal in [libc::SIGINT, libc::SIGTERM] {
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = handle_signal as *const () as libc::sighandler_t;
        action.sa_flags = 0;

        let rc = unsafe { libc::sigaction(signal, &action, std::ptr::null_mut()) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(())
}

/// Whether a shutdown has been requested.
pub fn requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Requests a shutdown, exactly as a signal would.
///
/// Lets embedders and tests stop a running reactor without involving
/// process signals.
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

/// Resets the flag so a later run can proceed.
///
/// A process that restarts its reactor after an orderly stop calls this
/// before the next `run`.
pub fn clear() {
    SHUTDOWN.store(false, Ordering::Relaxed);
}
