//! Raw HTTP stub for tests that need stalled responses or to stand in as a proxy

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Maps a request line to `(status, body)`. `None` leaves the request hanging.
pub(crate) type Responder = fn(&str) -> Option<(u16, &'static str)>;

pub(crate) struct StubServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl StubServer {
    pub(crate) async fn start(respond: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve(socket, respond, counter.clone()));
            }
        });

        Self { addr, hits }
    }

    /// `http://127.0.0.1:port`
    pub(crate) fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Proxy line pointing at this stub
    pub(crate) fn proxy_line(&self) -> String {
        format!("http://user:pass@{}", self.addr)
    }

    /// `host:port`, as shown in the Proxy column
    pub(crate) fn label(&self) -> String {
        self.addr.to_string()
    }

    /// Requests received so far, stalled ones included
    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve(mut socket: TcpStream, respond: Responder, hits: Arc<AtomicUsize>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        // GET requests carry no body, so a request ends at the blank line
        let end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };
        let head = String::from_utf8_lossy(&buf[..end]).into_owned();
        buf.drain(..end);
        hits.fetch_add(1, Ordering::SeqCst);

        let request_line = head.lines().next().unwrap_or_default();
        match respond(request_line) {
            Some((status, body)) => {
                let response = format!(
                    "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                if socket.write_all(response.as_bytes()).await.is_err() {
                    return;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }
}
