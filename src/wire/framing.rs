//! Body framing resolution.
//!
//! Pure decisions over a parsed header block; nothing here touches I/O.

use crate::headers::{value_of, Header};

/// How a message body is bounded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLength {
    /// Exactly this many bytes follow the header block.
    Fixed(u64),
    /// The body is chunk-framed and self-terminating.
    Chunked,
    /// Every remaining byte on the connection belongs to this body; the
    /// connection cannot be reused once it is drained.
    CloseDelimited,
}

/// Resolves the body framing for a parsed header block.
///
/// A Content-Length that parses as a non-negative integer wins over any
/// Transfer-Encoding; an unparseable one is ignored and the next rule
/// applies. Only the exact value `chunked` selects chunk framing — every
/// other transfer coding, `identity` included, falls through to
/// close-delimited.
pub fn body_length(headers: &[Header]) -> BodyLength {
    if let Some(value) = value_of(headers, "Content-Length") {
        if let Ok(n) = value.trim().parse::<u64>() {
            return BodyLength::Fixed(n);
        }
    }
    if let Some(value) = value_of(headers, "Transfer-Encoding") {
        if value.trim().eq_ignore_ascii_case("chunked") {
            return BodyLength::Chunked;
        }
    }
    BodyLength::CloseDelimited
}

/// True when the peer asked for the connection to be closed after this
/// message.
pub fn close_requested(headers: &[Header]) -> bool {
    value_of(headers, "Connection").is_some_and(|v| v.trim().eq_ignore_ascii_case("close"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<Header> {
        pairs.iter().map(|&(k, v)| Header::new(k, v)).collect()
    }

    #[test]
    fn content_length_framing() {
        assert_eq!(
            body_length(&headers(&[("Content-Length", "42")])),
            BodyLength::Fixed(42)
        );
        assert_eq!(
            body_length(&headers(&[("content-length", "0")])),
            BodyLength::Fixed(0)
        );
    }

    #[test]
    fn content_length_wins_over_transfer_encoding() {
        // deliberate precedence: a parseable length beats chunked framing
        let h = headers(&[
            ("Content-Length", "10"),
            ("Transfer-Encoding", "chunked"),
        ]);
        assert_eq!(body_length(&h), BodyLength::Fixed(10));
    }

    #[test]
    fn unparseable_content_length_falls_through() {
        let h = headers(&[
            ("Content-Length", "banana"),
            ("Transfer-Encoding", "chunked"),
        ]);
        assert_eq!(body_length(&h), BodyLength::Chunked);

        assert_eq!(
            body_length(&headers(&[("Content-Length", "-1")])),
            BodyLength::CloseDelimited
        );
    }

    #[test]
    fn chunked_framing() {
        assert_eq!(
            body_length(&headers(&[("Transfer-Encoding", "chunked")])),
            BodyLength::Chunked
        );
        assert_eq!(
            body_length(&headers(&[("transfer-encoding", "Chunked")])),
            BodyLength::Chunked
        );
    }

    #[test]
    fn unrecognized_transfer_coding_is_close_delimited() {
        assert_eq!(
            body_length(&headers(&[("Transfer-Encoding", "identity")])),
            BodyLength::CloseDelimited
        );
        assert_eq!(
            body_length(&headers(&[("Transfer-Encoding", "gzip, chunked")])),
            BodyLength::CloseDelimited
        );
    }

    #[test]
    fn no_framing_headers_means_close_delimited() {
        assert_eq!(body_length(&[]), BodyLength::CloseDelimited);
        assert_eq!(
            body_length(&headers(&[("Content-Type", "text/plain")])),
            BodyLength::CloseDelimited
        );
    }

    #[test]
    fn close_requested_is_case_insensitive() {
        assert!(close_requested(&headers(&[("Connection", "close")])));
        assert!(close_requested(&headers(&[("connection", "Close")])));
        assert!(!close_requested(&headers(&[("Connection", "keep-alive")])));
        assert!(!close_requested(&[]));
    }
}
