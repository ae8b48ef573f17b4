#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Keep-alive HTTP/1.1 mock server routing on the request path.
///
/// Tracks how many TCP connections were accepted so tests can observe
/// connection reuse.
pub struct MockServer {
    port: u16,
    connections: Arc<AtomicUsize>,
}

impl MockServer {
    /// Bind a random local port and start serving in a background task.
    pub async fn start() -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::clone(&connections);
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        accepted.fetch_add(1, Ordering::SeqCst);
                        tokio::spawn(handle_connection(stream));
                    }
                    Err(_) => break,
                }
            }
        });
        MockServer { port, connections }
    }

    /// Base URL for this server.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// host:port pair for dialing directly.
    pub fn host(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Number of TCP connections accepted so far.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Serve one connection, handling multiple requests until the client goes
/// away or a route demands closure.
async fn handle_connection(stream: TcpStream) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    loop {
        let mut request_line = String::new();
        match reader.read_line(&mut request_line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let mut parts = request_line.split_whitespace();
        let _method = parts.next().unwrap_or("");
        let target = parts.next().unwrap_or("/").to_string();

        let mut content_length = 0usize;
        let mut chunked = false;
        loop {
            let mut header = String::new();
            match reader.read_line(&mut header).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((key, value)) = header.split_once(':') {
                if key.trim().eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
                if key.trim().eq_ignore_ascii_case("transfer-encoding")
                    && value.trim().eq_ignore_ascii_case("chunked")
                {
                    chunked = true;
                }
            }
        }

        let body = if chunked {
            match read_chunked_body(&mut reader).await {
                Some(body) => body,
                None => return,
            }
        } else {
            let mut body = vec![0u8; content_length];
            if content_length > 0 && reader.read_exact(&mut body).await.is_err() {
                return;
            }
            body
        };

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target.as_str(), ""),
        };
        let reply = match path {
            "/hello" => plain(200, "OK", b"Hello"),
            "/echo" => plain(200, "OK", &body),
            "/query" => plain(200, "OK", query.as_bytes()),
            "/chunked" => {
                b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                  8\r\nall your\r\n16\r\n base are belong to us\r\n0\r\n\r\n"
                    .to_vec()
            }
            "/redirect" => {
                b"HTTP/1.1 302 Found\r\nLocation: /hello\r\nContent-Length: 0\r\n\r\n".to_vec()
            }
            "/gzip" => gzip_reply(b"squeezed"),
            "/close" => {
                b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\nConnection: close\r\n\r\nbye".to_vec()
            }
            _ => plain(404, "Not Found", b"404 page not found\n"),
        };

        if write.write_all(&reply).await.is_err() || write.flush().await.is_err() {
            return;
        }
        if path == "/close" {
            return;
        }
    }
}

/// Decode a chunked request body, including the terminating blank line.
async fn read_chunked_body(
    reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        if reader.read_line(&mut size_line).await.ok()? == 0 {
            return None;
        }
        let size = usize::from_str_radix(size_line.trim(), 16).ok()?;
        if size == 0 {
            let mut blank = String::new();
            let _ = reader.read_line(&mut blank).await;
            return Some(body);
        }
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).await.ok()?;
        chunk.truncate(size);
        body.extend_from_slice(&chunk);
    }
}

fn plain(code: u16, reason: &str, body: &[u8]) -> Vec<u8> {
    let mut reply = format!(
        "HTTP/1.1 {code} {reason}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\n\r\n",
        body.len()
    )
    .into_bytes();
    reply.extend_from_slice(body);
    reply
}

fn gzip_reply(body: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(body).unwrap();
    let compressed = encoder.finish().unwrap();
    let mut reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Encoding: gzip\r\n\r\n",
        compressed.len()
    )
    .into_bytes();
    reply.extend_from_slice(&compressed);
    reply
}
