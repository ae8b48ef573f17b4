//! Request serialization with strict phase ordering.

use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::{Error, Result};
use crate::version::Version;

/// Position in the request-line → headers → body write sequence.
///
/// The cycle returns to `RequestLine` after a body completes, which is the
/// point at which the same writer may serialize the next message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    RequestLine,
    Headers,
    Body,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::RequestLine => "requestline",
            Phase::Headers => "headers",
            Phase::Body => "body",
        })
    }
}

/// Each buffered read of a streamed body becomes one chunk of this size at most.
const CHUNK_BUFFER: usize = 8 * 1024;

/// Serializes HTTP requests onto `W`.
///
/// Every operation checks the current [`Phase`] before touching the wire,
/// so an out-of-order call fails without corrupting previously written
/// bytes. Output is buffered; [`Writer::flush`] pushes it to the stream.
pub struct Writer<W> {
    inner: BufWriter<W>,
    phase: Phase,
}

impl<W: AsyncWrite + Unpin> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
            phase: Phase::RequestLine,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    fn expect_phase(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::Phase {
                expected,
                got: self.phase,
            });
        }
        Ok(())
    }

    /// Writes `METHOD SP PATH[?QUERY] SP VERSION CRLF` and moves to the
    /// headers phase. Query parts are joined with `&`; an empty list leaves
    /// the target bare.
    pub async fn write_request_line(
        &mut self,
        method: &str,
        path: &str,
        query: &[String],
        version: Version,
    ) -> Result<()> {
        self.expect_phase(Phase::RequestLine)?;
        let mut line = String::with_capacity(method.len() + path.len() + 16);
        line.push_str(method);
        line.push(' ');
        line.push_str(path);
        if !query.is_empty() {
            line.push('?');
            line.push_str(&query.join("&"));
        }
        line.push(' ');
        line.push_str(&version.to_string());
        line.push_str("\r\n");
        self.inner.write_all(line.as_bytes()).await?;
        self.phase = Phase::Headers;
        Ok(())
    }

    /// Writes one `KEY: VALUE CRLF` header line verbatim.
    pub async fn write_header(&mut self, key: &str, value: &str) -> Result<()> {
        self.expect_phase(Phase::Headers)?;
        let mut line = String::with_capacity(key.len() + value.len() + 4);
        line.push_str(key);
        line.push_str(": ");
        line.push_str(value);
        line.push_str("\r\n");
        self.inner.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Terminates the header block with a blank line and enters the body
    /// phase. No further headers may be written for this message.
    pub async fn start_body(&mut self) -> Result<()> {
        self.expect_phase(Phase::Headers)?;
        self.inner.write_all(b"\r\n").await?;
        self.phase = Phase::Body;
        Ok(())
    }

    /// Copies `body` to the wire as-is, then readies the writer for the
    /// next message.
    pub async fn write_body<R>(&mut self, body: &mut R) -> Result<()>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.expect_phase(Phase::Body)?;
        tokio::io::copy(body, &mut self.inner).await?;
        self.phase = Phase::RequestLine;
        Ok(())
    }

    /// Copies `body` in chunked transfer encoding: each read buffer becomes
    /// one `{len:x}\r\n{data}\r\n` chunk, terminated by a zero-length chunk
    /// and a blank line. Readies the writer for the next message.
    pub async fn write_chunked<R>(&mut self, body: &mut R) -> Result<()>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.expect_phase(Phase::Body)?;
        let mut buf = vec![0u8; CHUNK_BUFFER];
        loop {
            let n = body.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.inner.write_all(format!("{n:x}\r\n").as_bytes()).await?;
            self.inner.write_all(&buf[..n]).await?;
            self.inner.write_all(b"\r\n").await?;
        }
        self.inner.write_all(b"0\r\n\r\n").await?;
        self.phase = Phase::RequestLine;
        Ok(())
    }

    /// Flushes buffered output to the underlying stream.
    pub async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await?;
        Ok(())
    }

    /// Flushes and shuts down the write side of the stream.
    pub(crate) async fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown().await?;
        Ok(())
    }
}
