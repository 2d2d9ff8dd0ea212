mod listener;

pub use listener::Listener;
