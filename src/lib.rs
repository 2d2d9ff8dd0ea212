//! # Paratus
//!
//! **Paratus** is a single-threaded, readiness-driven HTTP server built
//! directly on Linux `epoll`.
//!
//! Unlike servers that spawn a thread per connection or sit on top of an
//! async runtime, Paratus multiplexes every connection on one thread using
//! only kernel-level non-blocking I/O. One `epoll` instance watches the
//! listening socket and all accepted connections; the reactor loop waits
//! for readiness, accepts, accumulates request bytes, and answers each
//! complete request with a fixed JSON response before closing.
//!
//! The moving parts are deliberately few:
//!
//! - A **reactor** owning the event loop and all per-connection state
//! - A **poller** wrapping level-triggered `epoll` registration and waits
//! - A **non-blocking listener** that drains its accept backlog per
//!   readiness notification
//! - **Pure response formatting** for the one response it ever sends
//! - A **signal-driven shutdown flag** polled once per loop iteration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use paratus::{Config, Reactor};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!
//!     paratus::shutdown::install()?;
//!     Reactor::bind(&config)?.run()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] — CLI and environment configuration
//! - [`http`] — Response formatting
//! - [`net`] — The non-blocking TCP listener
//! - [`shutdown`] — Signal handlers and the shutdown flag

mod reactor;

pub mod config;
pub mod http;
pub mod net;
pub mod shutdown;

pub use config::Config;
pub use reactor::Reactor;
