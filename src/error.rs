//! Error types for the tether crate.

use std::io;
use std::time::Duration;

use crate::wire::Phase;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding, decoding, or transporting HTTP
/// messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A write was attempted in the wrong encoder phase. Always a caller
    /// sequencing bug; the writer refuses before touching the wire.
    #[error("phase error: expected {expected}, got {got}")]
    Phase { expected: Phase, got: Phase },

    /// Malformed status line, reported against the offending byte.
    #[error("malformed status line: expected {expected}, got {got} at position {at}")]
    StatusLine {
        expected: &'static str,
        got: String,
        at: usize,
    },

    /// Header line without a colon, or with an empty name.
    #[error("invalid header line: {0:?}")]
    InvalidHeader(String),

    /// Chunked transfer encoding that cannot be decoded.
    #[error("invalid chunk framing: {0}")]
    InvalidChunk(String),

    /// The peer closed the connection before a complete message element
    /// was received. Distinct from a clean end-of-body boundary.
    #[error("unexpected end of stream: {0}")]
    UnexpectedEof(String),

    /// Scheme the dialer cannot handle.
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// URL without a host component.
    #[error("URL has no host: {0}")]
    MissingHost(String),

    /// Operation exceeded its configured time limit.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Redirect chain longer than the configured limit.
    #[error("redirect limit exceeded ({count} redirects)")]
    RedirectLimit { count: u32 },

    /// Redirect response whose Location cannot be followed.
    #[error("invalid redirect location: {0}")]
    InvalidRedirect(String),

    /// Content-Encoding the response decoder could not reverse.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an invalid-header error for the given line.
    pub fn invalid_header(line: impl Into<String>) -> Self {
        Self::InvalidHeader(line.into())
    }

    /// Create an invalid-chunk error.
    pub fn invalid_chunk(message: impl Into<String>) -> Self {
        Self::InvalidChunk(message.into())
    }

    /// Create an unexpected-EOF error.
    pub fn unexpected_eof(message: impl Into<String>) -> Self {
        Self::UnexpectedEof(message.into())
    }

    /// True for malformed-input errors. The connection that produced the
    /// message must be discarded, never pooled.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::StatusLine { .. } | Self::InvalidHeader(_) | Self::InvalidChunk(_)
        )
    }

    /// True when the peer hung up mid-message, as opposed to a clean
    /// message boundary.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::UnexpectedEof(_))
    }
}
