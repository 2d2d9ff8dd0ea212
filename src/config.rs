//! Server configuration.
//!
//! Every knob is settable as a CLI flag or an environment variable, with
//! the flag winning when both are present.

use clap::Parser;

/// Configuration for the server process.
#[derive(Debug, Clone, Parser)]
#[command(name = "paratus")]
#[command(about = "A single-threaded, readiness-driven HTTP server built on raw Linux epoll")]
#[command(version)]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "PARATUS_PORT")]
    pub port: u16,

    /// Address to bind, IPv4 or IPv6
    #[arg(short, long, default_value = "0.0.0.0", env = "PARATUS_BIND")]
    pub bind: String,

    /// Listen backlog passed to the kernel
    #[arg(long, default_value = "1024", env = "PARATUS_BACKLOG")]
    pub backlog: i32,
}

impl Config {
    /// The full bind address, `host:port`.
    ///
    /// An IPv6 host is bracketed so the port separator stays unambiguous;
    /// a host given already bracketed is normalized first.
    pub fn addr(&self) -> String {
        let host = self.bind.trim_start_matches('[').trim_end_matches(']');

        if host.contains(':') {
            format!("[{host}]:{}", self.port)
        } else {
            format!("{host}:{}", self.port)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind: "0.0.0.0".to_string(),
            backlog: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.port, 8080);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.backlog, 1024);
    }

    #[test]
    fn test_addr_ipv4() {
        let config = Config::default();

        assert_eq!(config.addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_addr_brackets_ipv6() {
        let config = Config {
            bind: "::1".to_string(),
            ..Config::default()
        };

        assert_eq!(config.addr(), "[::1]:8080");
    }

    #[test]
    fn test_addr_normalizes_bracketed_ipv6() {
        let config = Config {
            bind: "[::]".to_string(),
            port: 9000,
            ..Config::default()
        };

        assert_eq!(config.addr(), "[::]:9000");
    }

    #[test]
    fn test_parses_defaults_from_no_args() {
        let config = Config::try_parse_from(["paratus"]).expect("Failed to parse args");

        assert_eq!(config.port, 8080);
        assert_eq!(config.bind, "0.0.0.0");
    }

    #[test]
    fn test_parses_flags() {
        let config = Config::try_parse_from(["paratus", "--port", "9000", "--bind", "127.0.0.1"])
            .expect("Failed to parse args");

        assert_eq!(config.port, 9000);
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.addr(), "127.0.0.1:9000");
    }
}
