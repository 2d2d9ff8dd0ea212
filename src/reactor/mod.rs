mod conn;
mod core;
mod event;

pub(crate) mod poller;

pub use core::Reactor;
