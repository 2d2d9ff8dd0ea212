/// Readiness interests a descriptor can be registered with.
///
/// The listening socket is registered read-only; connection sockets add
/// `peer_hangup` so the poller reports the peer closing its end even when
/// no data is pending.
#[derive(Clone, Copy)]
pub(crate) struct Interest {
    pub(crate) read: bool,
    pub(crate) peer_hangup: bool,
}
