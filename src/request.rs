//! HTTP request values.

use std::fmt;

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::headers::Header;
use crate::version::Version;

/// Byte source for a request body.
pub enum Body {
    /// No body; no length headers are emitted for the request.
    Empty,
    /// In-memory body with a known byte count, sent with Content-Length.
    Full(Bytes),
    /// Streaming body of unknown length: chunked on HTTP/1.1, identity
    /// until connection close on HTTP/1.0.
    Streaming(Box<dyn AsyncRead + Send + Unpin>),
}

impl Body {
    pub fn full(bytes: impl Into<Bytes>) -> Self {
        Self::Full(bytes.into())
    }

    pub fn streaming(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Streaming(Box::new(reader))
    }

    /// Byte count when the source is deterministic; `None` when only the
    /// stream itself knows.
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::Empty => Some(0),
            Self::Full(bytes) => Some(bytes.len() as u64),
            Self::Streaming(_) => None,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::Empty
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Body::Empty"),
            Self::Full(bytes) => write!(f, "Body::Full({} bytes)", bytes.len()),
            Self::Streaming(_) => f.write_str("Body::Streaming(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Full(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Full(bytes.into())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Full(text.into())
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::Full(Bytes::from_static(text.as_bytes()))
    }
}

/// A complete HTTP request.
///
/// `query` holds raw `key=value` fragments that are joined with `&` on the
/// wire; an empty list leaves the request target bare.
#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: Vec<String>,
    pub version: Version,
    pub headers: Vec<Header>,
    pub body: Body,
}

impl Request {
    /// Request for `path` with no headers, no body, HTTP/1.1.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: Vec::new(),
            version: Version::HTTP_1_1,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// Appends a header, preserving insertion order.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(key, value));
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }
}
