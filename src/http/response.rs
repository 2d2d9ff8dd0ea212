//! Response formatting.
//!
//! Pure functions that turn a status code and a body into the exact bytes
//! sent on the wire. Every response is `HTTP/1.1`, `application/json`, and
//! `Connection: close`; the server never keeps a connection alive.

use serde::Serialize;

/// Body of every response the server produces.
///
/// Rendered with `serde_json` so a peer address containing characters
/// special to JSON is escaped rather than corrupting the document.
#[derive(Serialize)]
struct Body<'a> {
    message: &'a str,
    remote: &'a str,
}

/// Greeting sent on every completed request.
const GREETING: &str = "Hello from raw epoll server";

/// Sent with `400` when a client never terminates its header section.
const REJECTION: &str = "request headers too large";

/// The reason phrase for a status code.
///
/// Finite by construction; codes outside the table fall back to `OK`.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Renders a complete response: status line, fixed header set, and body.
///
/// `Content-Length` is the exact byte length of `body`, which is what lets
/// clients that trust it read the body without waiting for EOF.
pub fn format_response(status: u16, body: &[u8]) -> Vec<u8> {
    let header = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {length}\r\nConnection: close\r\n\r\n",
        reason = reason_phrase(status),
        length = body.len(),
    );

    let mut response = Vec::with_capacity(header.len() + body.len());
    response.extend_from_slice(header.as_bytes());
    response.extend_from_slice(body);

    response
}

/// The 200 body for a completed request from `remote`.
pub fn greeting_body(remote: &str) -> Vec<u8> {
    render(GREETING, remote)
}

/// The 400 body for a client whose header section never ended.
pub fn rejection_body(remote: &str) -> Vec<u8> {
    render(REJECTION, remote)
}

fn render(message: &str, remote: &str) -> Vec<u8> {
    serde_json::to_vec(&Body { message, remote })
        .expect("a two-string-field body always serializes")
}
