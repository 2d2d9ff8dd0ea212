#[cfg(test)]
mod tests {
    use paratus::{Config, Reactor};

    use std::io::{Read, Write};
    use std::net::{Shutdown, SocketAddr, TcpStream};
    use std::thread;
    use std::time::Duration;

    const REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";

    fn start_server() -> SocketAddr {
        let config = Config {
            port: 0,
            bind: "127.0.0.1".to_string(),
            ..Config::default()
        };

        let mut reactor = Reactor::bind(&config).expect("Failed to bind reactor");
        reactor.set_poll_timeout(Some(Duration::from_millis(50)));

        let addr = reactor.local_addr().expect("Failed to get local address");
        thread::spawn(move || reactor.run());

        addr
    }

    #[test]
    fn test_survives_silent_disconnect() {
        let addr = start_server();

        // Connect and immediately hang up without sending a byte.
        for _ in 0..3 {
            let stream = TcpStream::connect(addr).expect("Failed to connect to server");
            drop(stream);
        }

        // Let the server observe and discard the dead connections.
        thread::sleep(Duration::from_millis(150));

        let mut stream = TcpStream::connect(addr).expect("Failed to connect to server");
        stream.write_all(REQUEST).expect("Failed to write request");

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .expect("Failed to read response");

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    }

    #[test]
    fn test_mid_request_disconnect() {
        let addr = start_server();

        let mut stream = TcpStream::connect(addr).expect("Failed to connect to server");
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: lo")
            .expect("Failed to write fragment");
        thread::sleep(Duration::from_millis(100));
        drop(stream);

        thread::sleep(Duration::from_millis(150));

        let mut stream = TcpStream::connect(addr).expect("Failed to connect to server");
        stream.write_all(REQUEST).expect("Failed to write request");

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .expect("Failed to read response");

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    }

    #[test]
    fn test_oversized_headers_rejected() {
        let addr = start_server();

        let mut stream = TcpStream::connect(addr).expect("Failed to connect to server");

        // Just past the 64 KiB cap, with no terminator anywhere.
        let oversized = vec![b'A'; 66 * 1024];
        stream
            .write_all(&oversized)
            .expect("Failed to write oversized request");

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .expect("Failed to read response");

        let (head, body) = response
            .split_once("\r\n\r\n")
            .expect("Failed to find end of headers");

        assert!(head.starts_with("HTTP/1.1 400 Bad Request\r\n"));

        let value: serde_json::Value =
            serde_json::from_str(body).expect("Failed to parse response body");
        assert_eq!(value["message"], "request headers too large");
    }

    #[test]
    fn test_half_close_after_request_is_answered() {
        let addr = start_server();

        let mut stream = TcpStream::connect(addr).expect("Failed to connect to server");
        stream.write_all(REQUEST).expect("Failed to write request");
        stream
            .shutdown(Shutdown::Write)
            .expect("Failed to shut down write side");

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .expect("Failed to read response");

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    }
}
