#[cfg(test)]
mod tests {
    use paratus::{Config, Reactor};

    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
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

    fn exchange(addr: SocketAddr) -> (String, String) {
        let mut stream = TcpStream::connect(addr).expect("Failed to connect to server");
        let local = stream
            .local_addr()
            .expect("Failed to get client address")
            .to_string();

        stream.write_all(REQUEST).expect("Failed to write request");

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .expect("Failed to read response");

        (response, local)
    }

    #[test]
    fn test_serves_complete_request() {
        let addr = start_server();
        let (response, local) = exchange(addr);

        let (head, body) = response
            .split_once("\r\n\r\n")
            .expect("Failed to find end of headers");

        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("Content-Type: application/json"));
        assert!(head.contains("Connection: close"));

        let value: serde_json::Value =
            serde_json::from_str(body).expect("Failed to parse response body");

        assert_eq!(value["message"], "Hello from raw epoll server");
        assert_eq!(value["remote"], local.as_str());
    }

    #[test]
    fn test_content_length_is_exact() {
        let addr = start_server();
        let (response, _) = exchange(addr);

        let (head, body) = response
            .split_once("\r\n\r\n")
            .expect("Failed to find end of headers");

        let length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("Content-Length: "))
            .expect("Failed to find Content-Length")
            .parse()
            .expect("Failed to parse Content-Length");

        assert_eq!(length, body.len());
    }

    #[test]
    fn test_closes_connection_after_response() {
        let addr = start_server();

        let mut stream = TcpStream::connect(addr).expect("Failed to connect to server");
        stream.write_all(REQUEST).expect("Failed to write request");

        let mut response = Vec::new();
        stream
            .read_to_end(&mut response)
            .expect("Failed to read response");
        assert!(!response.is_empty());

        // EOF already observed; a further read reports it again.
        let mut buffer = [0; 16];
        let n = stream.read(&mut buffer).expect("Failed to read after EOF");
        assert_eq!(n, 0);
    }

    #[test]
    fn test_sequential_clients() {
        let addr = start_server();

        for _ in 0..3 {
            let (response, local) = exchange(addr);

            let (_, body) = response
                .split_once("\r\n\r\n")
                .expect("Failed to find end of headers");
            let value: serde_json::Value =
                serde_json::from_str(body).expect("Failed to parse response body");

            assert_eq!(value["remote"], local.as_str());
        }
    }

    #[test]
    fn test_concurrent_clients() {
        let addr = start_server();

        let clients: Vec<_> = (0..4)
            .map(|_| {
                thread::spawn(move || {
                    let (response, local) = exchange(addr);

                    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));

                    let (_, body) = response
                        .split_once("\r\n\r\n")
                        .expect("Failed to find end of headers");
                    let value: serde_json::Value =
                        serde_json::from_str(body).expect("Failed to parse response body");

                    // Each client is answered about its own connection.
                    assert_eq!(value["remote"], local.as_str());
                })
            })
            .collect();

        for client in clients {
            client.join().expect("Thread panicked");
        }
    }
}
