//! A canned-response HTTP stub for transport tests.
//!
//! Binds an ephemeral local port and answers each connection with the next
//! response from the list (repeating the last one). Connections are closed
//! after every response so clients cannot pipeline into stale state.

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One canned response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Serve canned responses on an ephemeral port; returns the bound address.
pub async fn http_stub(responses: Vec<StubResponse>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut served = 0usize;
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let response = responses
                .get(served.min(responses.len().saturating_sub(1)))
                .cloned()
                .unwrap_or_else(|| StubResponse::status(500));
            served += 1;

            // Drain the request head before answering.
            let mut buf = [0u8; 4096];
            let mut head = Vec::new();
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        head.extend_from_slice(&buf[..n]);
                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    Err(_) => return,
                }
            }

            let reason = if response.status == 200 { "OK" } else { "Error" };
            let header = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                response.status,
                reason,
                response.body.len()
            );
            let _ = socket.write_all(header.as_bytes()).await;
            let _ = socket.write_all(&response.body).await;
            let _ = socket.shutdown().await;
        }
    });

    addr
}

/// A server that accepts connections and never responds, for timeout tests.
pub async fn http_stub_silent() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            held.push(socket);
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
