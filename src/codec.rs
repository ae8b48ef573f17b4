//! Message codec: one writer and one reader composed over a single stream.
//!
//! A [`Codec`] owns both directions of a connection and runs full
//! request/response exchanges, strictly sequentially. It also keeps the
//! two facts the pooling layer depends on: whether either side demanded
//! closure, and whether the last response body was drained to its boundary.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};

use crate::error::{Error, Result};
use crate::headers::{value_of, Header};
use crate::request::{Body, Request};
use crate::status::Status;
use crate::timeouts::{maybe_timeout, Timeouts};
use crate::version::Version;
use crate::wire::{body_length, close_requested, BodyLength, Reader, Writer};

/// Per-connection request writer / response reader.
pub struct Codec<S> {
    writer: Writer<WriteHalf<S>>,
    reader: Reader<ReadHalf<S>>,
    timeouts: Timeouts,
    /// Cleared when closure is demanded or an error leaves the stream
    /// indeterminate.
    reusable: bool,
    /// Set when the current response body has been consumed to its boundary.
    drained: bool,
}

impl<S: AsyncRead + AsyncWrite> Codec<S> {
    pub fn new(stream: S) -> Self {
        Self::with_timeouts(stream, Timeouts::default())
    }

    pub fn with_timeouts(stream: S, timeouts: Timeouts) -> Self {
        let (read, write) = tokio::io::split(stream);
        Self {
            writer: Writer::new(write),
            reader: Reader::new(read),
            timeouts,
            reusable: true,
            drained: true,
        }
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn timeouts_mut(&mut self) -> &mut Timeouts {
        &mut self.timeouts
    }

    /// True when the previous exchange finished cleanly: the response body
    /// was fully drained and neither side demanded closure. Only then may
    /// the connection be handed back for reuse.
    pub fn is_reusable(&self) -> bool {
        self.reusable && self.drained
    }

    /// Serializes `req` onto the wire: request line, headers in order, then
    /// the body with its length signalled by Content-Length (known size),
    /// chunked transfer encoding (unknown size, HTTP/1.1), or eventual
    /// connection close (unknown size, HTTP/1.0).
    ///
    /// Any error leaves the stream indeterminate; the connection must be
    /// closed, not reused.
    pub async fn write_request(&mut self, req: Request) -> Result<()> {
        let limit = self.timeouts.write;
        let result = maybe_timeout(limit, self.write_request_inner(req)).await;
        if result.is_err() {
            self.reusable = false;
        }
        result
    }

    async fn write_request_inner(&mut self, req: Request) -> Result<()> {
        let Request {
            method,
            path,
            query,
            version,
            headers,
            body,
        } = req;
        self.writer
            .write_request_line(&method, &path, &query, version)
            .await?;
        for header in &headers {
            self.writer.write_header(&header.key, &header.value).await?;
        }
        match body {
            Body::Empty => {
                self.writer.start_body().await?;
                self.writer.write_body(&mut tokio::io::empty()).await?;
            }
            Body::Full(bytes) => {
                self.writer
                    .write_header("Content-Length", &bytes.len().to_string())
                    .await?;
                self.writer.start_body().await?;
                let mut data = bytes.as_ref();
                self.writer.write_body(&mut data).await?;
            }
            Body::Streaming(mut stream) => {
                if version.supports_chunked() {
                    self.writer
                        .write_header("Transfer-Encoding", "chunked")
                        .await?;
                    self.writer.start_body().await?;
                    self.writer.write_chunked(stream.as_mut()).await?;
                } else {
                    // the end of this body can only be signalled by closing
                    // the connection
                    self.reusable = false;
                    self.writer.start_body().await?;
                    self.writer.write_body(stream.as_mut()).await?;
                }
            }
        }
        self.writer.flush().await
    }

    /// Reads the status line and header block, resolves the body framing,
    /// and returns a response whose body reader stops exactly at the
    /// message boundary. Redirect statuses come back as-is; following them
    /// is a caller concern.
    pub async fn read_response(&mut self) -> Result<Response<'_, S>> {
        let limit = self.timeouts.read;
        let head = maybe_timeout(limit, Self::read_head(&mut self.reader)).await;
        let (version, status, headers) = match head {
            Ok(head) => head,
            Err(err) => {
                self.reusable = false;
                return Err(err);
            }
        };
        if close_requested(&headers) {
            self.reusable = false;
        }
        let state = match body_length(&headers) {
            BodyLength::Fixed(0) => ReadState::Done,
            BodyLength::Fixed(n) => ReadState::Fixed { remaining: n },
            BodyLength::Chunked => ReadState::Chunked {
                remaining: 0,
                seen_first: false,
            },
            BodyLength::CloseDelimited => {
                self.reusable = false;
                ReadState::UntilClose
            }
        };
        self.drained = matches!(state, ReadState::Done);
        Ok(Response {
            version,
            status,
            headers,
            body: BodyReader { codec: self, state },
        })
    }

    async fn read_head(
        reader: &mut Reader<ReadHalf<S>>,
    ) -> Result<(Version, Status, Vec<Header>)> {
        let (version, status) = reader.read_status_line().await?;
        let mut headers = Vec::new();
        while let Some(header) = reader.read_header().await? {
            headers.push(header);
        }
        Ok((version, status, headers))
    }

    /// Flushes and shuts down the write side of the stream.
    pub(crate) async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await
    }
}

/// A decoded response head plus its bounded body stream.
///
/// Borrows the codec until dropped: the connection cannot start another
/// exchange, be released, or be closed while a response is outstanding.
pub struct Response<'c, S> {
    pub version: Version,
    pub status: Status,
    pub headers: Vec<Header>,
    pub body: BodyReader<'c, S>,
}

impl<S> Response<'_, S> {
    /// First value of `name`, comparing names case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        value_of(&self.headers, name)
    }
}

impl<S> std::fmt::Debug for Response<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("version", &self.version)
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum ReadState {
    Fixed { remaining: u64 },
    Chunked { remaining: u64, seen_first: bool },
    UntilClose,
    Done,
}

/// Streams a response body without ever reading past its framing boundary,
/// leaving any buffered bytes after it for the next message.
pub struct BodyReader<'c, S> {
    codec: &'c mut Codec<S>,
    state: ReadState,
}

impl<S: AsyncRead + AsyncWrite> BodyReader<'_, S> {
    /// Reads up to `buf.len()` body bytes. `Ok(0)` marks the end of the
    /// body; a peer that closes earlier than the declared boundary yields
    /// an incomplete-message error instead.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let limit = self.codec.timeouts.read;
        let result = maybe_timeout(limit, self.read_inner(buf)).await;
        if result.is_err() {
            self.codec.reusable = false;
        }
        result
    }

    async fn read_inner(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.state {
                ReadState::Done => return Ok(0),
                ReadState::Fixed { remaining } => {
                    let want = remaining.min(buf.len() as u64) as usize;
                    let n = self.codec.reader.read_data(&mut buf[..want]).await?;
                    if n == 0 {
                        return Err(Error::unexpected_eof(format!(
                            "connection closed with {remaining} body bytes outstanding"
                        )));
                    }
                    let remaining = remaining - n as u64;
                    if remaining == 0 {
                        self.state = ReadState::Done;
                        self.codec.drained = true;
                    } else {
                        self.state = ReadState::Fixed { remaining };
                    }
                    return Ok(n);
                }
                ReadState::Chunked {
                    remaining: 0,
                    seen_first,
                } => {
                    if seen_first {
                        self.codec.reader.read_chunk_terminator().await?;
                    }
                    let size = self.codec.reader.read_chunk_size().await?;
                    if size == 0 {
                        self.codec.reader.skip_chunk_trailer().await?;
                        self.state = ReadState::Done;
                        self.codec.drained = true;
                        return Ok(0);
                    }
                    self.state = ReadState::Chunked {
                        remaining: size,
                        seen_first: true,
                    };
                }
                ReadState::Chunked {
                    remaining,
                    seen_first,
                } => {
                    let want = remaining.min(buf.len() as u64) as usize;
                    let n = self.codec.reader.read_data(&mut buf[..want]).await?;
                    if n == 0 {
                        return Err(Error::unexpected_eof("connection closed mid-chunk"));
                    }
                    self.state = ReadState::Chunked {
                        remaining: remaining - n as u64,
                        seen_first,
                    };
                    return Ok(n);
                }
                ReadState::UntilClose => {
                    let n = self.codec.reader.read_data(buf).await?;
                    if n == 0 {
                        self.state = ReadState::Done;
                        self.codec.drained = true;
                        return Ok(0);
                    }
                    return Ok(n);
                }
            }
        }
    }

    /// Reads the remainder of the body into one buffer.
    pub async fn bytes(&mut self) -> Result<Bytes> {
        let mut out = Vec::new();
        let mut buf = [0u8; 8 * 1024];
        loop {
            let n = self.read(&mut buf).await?;
            if n == 0 {
                return Ok(Bytes::from(out));
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    /// Reads and discards through the end of the body, returning how many
    /// bytes were thrown away.
    pub async fn drain(&mut self) -> Result<u64> {
        let mut discarded = 0u64;
        let mut buf = [0u8; 8 * 1024];
        loop {
            let n = self.read(&mut buf).await?;
            if n == 0 {
                return Ok(discarded);
            }
            discarded += n as u64;
        }
    }

    /// True once the body has been consumed to its boundary.
    pub fn is_drained(&self) -> bool {
        matches!(self.state, ReadState::Done)
    }
}
