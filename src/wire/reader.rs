//! Response parsing: status line, headers, and the primitives the body
//! decoders are built from.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::error::{Error, Result};
use crate::headers::Header;
use crate::status::Status;
use crate::version::Version;

const READ_BUFFER: usize = 4096;

/// Streaming single-pass parser over a buffered byte source.
///
/// Call order — status line, headers until `None`, then body reads — is the
/// caller's responsibility; the codec enforces it.
pub struct Reader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::with_capacity(READ_BUFFER, inner),
        }
    }

    /// Reads one line including its `\n` terminator. A stream that ends
    /// before the terminator is an incomplete message, not a clean EOF.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        let n = self.inner.read_until(b'\n', &mut line).await?;
        if n == 0 {
            return Err(Error::unexpected_eof("connection closed before a complete line"));
        }
        if line.last() != Some(&b'\n') {
            return Err(Error::unexpected_eof("connection closed mid-line"));
        }
        Ok(line)
    }

    /// Reads and parses `VERSION SP CODE SP REASON CRLF`.
    pub async fn read_status_line(&mut self) -> Result<(Version, Status)> {
        let line = self.read_line().await?;
        parse_status_line(&line)
    }

    /// Reads one header line. `None` marks the end of the header block —
    /// distinguishable from an error, which means the line was malformed
    /// or the connection died mid-headers.
    pub async fn read_header(&mut self) -> Result<Option<Header>> {
        let line = self.read_line().await?;
        if line == b"\r\n" || line == b"\n" {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&line);
        // A colon-less line here is invalid no matter what it looks like;
        // a status line leaking in from a mangled prior response gets the
        // same treatment, with no recovery attempted.
        let Some((key, value)) = text.split_once(':') else {
            return Err(Error::invalid_header(text.into_owned()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::invalid_header(text.into_owned()));
        }
        Ok(Some(Header::new(key, value.trim())))
    }

    /// Plain read into `buf`; the caller bounds it to stay inside the body.
    pub(crate) async fn read_data(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.inner.read(buf).await?)
    }

    /// Reads the `{hexlen}\r\n` line that opens a chunk. Chunk extensions
    /// after `;` are ignored.
    pub(crate) async fn read_chunk_size(&mut self) -> Result<u64> {
        let line = match self.read_line().await {
            Ok(line) => line,
            Err(Error::UnexpectedEof(_)) => {
                return Err(Error::unexpected_eof("connection closed mid-chunk header"))
            }
            Err(err) => return Err(err),
        };
        let text = String::from_utf8_lossy(&line);
        let text = text.trim();
        let size = match text.split_once(';') {
            Some((size, _extensions)) => size.trim_end(),
            None => text,
        };
        u64::from_str_radix(size, 16)
            .map_err(|_| Error::invalid_chunk(format!("bad chunk size line {text:?}")))
    }

    /// Consumes the CRLF that closes a chunk's data.
    pub(crate) async fn read_chunk_terminator(&mut self) -> Result<()> {
        let mut crlf = [0u8; 2];
        match self.inner.read_exact(&mut crlf).await {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(Error::unexpected_eof("connection closed mid-chunk"));
            }
            Err(err) => return Err(err.into()),
        }
        if &crlf != b"\r\n" {
            return Err(Error::invalid_chunk("missing CRLF after chunk data"));
        }
        Ok(())
    }

    /// Skips trailer lines after the zero-length chunk, through the blank
    /// line. EOF directly after the final chunk is accepted.
    pub(crate) async fn skip_chunk_trailer(&mut self) -> Result<()> {
        loop {
            let mut line = Vec::new();
            let n = self.inner.read_until(b'\n', &mut line).await?;
            if n == 0 {
                return Ok(());
            }
            if line == b"\r\n" || line == b"\n" {
                return Ok(());
            }
        }
    }
}

fn parse_status_line(line: &[u8]) -> Result<(Version, Status)> {
    const PREFIX: &[u8] = b"HTTP/";
    const PREFIX_NAMES: [&str; 5] = ["'H'", "'T'", "'T'", "'P'", "'/'"];
    for (at, (&expected, name)) in PREFIX.iter().zip(PREFIX_NAMES).enumerate() {
        match line.get(at) {
            Some(&c) if c == expected => {}
            got => return Err(status_line_err(name, got, at)),
        }
    }
    let major = digit_at(line, 5)?;
    expect_at(line, 6, b'.', "'.'")?;
    let minor = digit_at(line, 7)?;
    expect_at(line, 8, b' ', "' '")?;
    let code =
        u16::from(digit_at(line, 9)?) * 100 + u16::from(digit_at(line, 10)?) * 10
            + u16::from(digit_at(line, 11)?);
    // a space introduces the reason phrase; a bare line end after the code
    // means the reason is empty
    let reason = match line.get(12) {
        Some(&b' ') => trim_line_end(&line[13..]),
        Some(&b'\r') | Some(&b'\n') | None => String::new(),
        got => return Err(status_line_err("' '", got, 12)),
    };
    Ok((Version::new(major, minor), Status::new(code, reason)))
}

fn trim_line_end(rest: &[u8]) -> String {
    let text = String::from_utf8_lossy(rest);
    text.trim_end_matches(['\r', '\n']).to_string()
}

fn digit_at(line: &[u8], at: usize) -> Result<u8> {
    match line.get(at) {
        Some(&c) if c.is_ascii_digit() => Ok(c - b'0'),
        got => Err(status_line_err("digit", got, at)),
    }
}

fn expect_at(line: &[u8], at: usize, expected: u8, name: &'static str) -> Result<()> {
    match line.get(at) {
        Some(&c) if c == expected => Ok(()),
        got => Err(status_line_err(name, got, at)),
    }
}

fn status_line_err(expected: &'static str, got: Option<&u8>, at: usize) -> Error {
    let got = match got {
        Some(&b) => format!("{:?}", b as char),
        None => "end of line".to_string(),
    };
    Error::StatusLine { expected, got, at }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(input: &[u8]) -> Reader<&[u8]> {
        Reader::new(input)
    }

    #[tokio::test]
    async fn status_line_with_reason() {
        let mut r = reader(b"HTTP/1.0 200 OK\r\n\r\n");
        let (version, status) = r.read_status_line().await.unwrap();
        assert_eq!(version, Version::HTTP_1_0);
        assert_eq!(status, Status::new(200, "OK"));
        // the blank line that follows is the end of an empty header block
        assert_eq!(r.read_header().await.unwrap(), None);
    }

    #[tokio::test]
    async fn status_line_without_reason() {
        let mut r = reader(b"HTTP/1.0 200\r\n");
        let (version, status) = r.read_status_line().await.unwrap();
        assert_eq!(version, Version::HTTP_1_0);
        assert_eq!(status, Status::new(200, ""));
    }

    #[tokio::test]
    async fn status_line_lf_only_terminator() {
        let mut r = reader(b"HTTP/1.1 404 Not Found\n");
        let (version, status) = r.read_status_line().await.unwrap();
        assert_eq!(version, Version::HTTP_1_1);
        assert_eq!(status, Status::new(404, "Not Found"));
    }

    #[tokio::test]
    async fn malformed_status_lines_name_the_position() {
        let cases: &[(&[u8], usize)] = &[
            (b"http/1.1 200 OK\r\n", 0),
            (b"Http/1.1 200 OK\r\n", 1),
            (b"HTTp/1.1 200 OK\r\n", 3),
            (b"HTTP#1.1 200 OK\r\n", 4),
            (b"HTTP/x.1 200 OK\r\n", 5),
            (b"HTTP/11 200 OK\r\n", 6),
            (b"HTTP/1.x 200 OK\r\n", 7),
            (b"HTTP/1.10 200 OK\r\n", 8),
            (b"HTTP/1.1 2x0 OK\r\n", 10),
            (b"HTTP/1.1 2000 OK\r\n", 12),
        ];
        for (input, at) in cases {
            let mut r = reader(input);
            match r.read_status_line().await.unwrap_err() {
                Error::StatusLine { at: got, .. } => {
                    assert_eq!(got, *at, "input {:?}", String::from_utf8_lossy(input))
                }
                other => panic!("expected status line error, got {other}"),
            }
        }
    }

    #[tokio::test]
    async fn truncated_status_line_is_incomplete() {
        let mut r = reader(b"HTTP/1.0 200");
        let err = r.read_status_line().await.unwrap_err();
        assert!(err.is_incomplete(), "got {err}");

        let mut r = reader(b"");
        let err = r.read_status_line().await.unwrap_err();
        assert!(err.is_incomplete(), "got {err}");
    }

    #[tokio::test]
    async fn header_parsing() {
        let cases: &[(&[u8], &str, &str)] = &[
            (b"Host: localhost\r\n", "Host", "localhost"),
            (b"Connection:close\r\n", "Connection", "close"),
            (b"Vary : gzip\r\n", "Vary", "gzip"),
            (b"Host: foo\n", "Host", "foo"),
            (b"Pragma: \r\n", "Pragma", ""),
        ];
        for (input, key, value) in cases {
            let mut r = reader(input);
            let header = r.read_header().await.unwrap().unwrap();
            assert_eq!(header.key, *key);
            assert_eq!(header.value, *value);
        }
    }

    #[tokio::test]
    async fn first_header_of_block() {
        let mut r = reader(b"Host: localhost\r\n\r\n");
        let header = r.read_header().await.unwrap().unwrap();
        assert_eq!((header.key.as_str(), header.value.as_str()), ("Host", "localhost"));
        assert_eq!(r.read_header().await.unwrap(), None);
    }

    #[tokio::test]
    async fn colonless_header_is_invalid() {
        let mut r = reader(b"Host localhost\r\n");
        let err = r.read_header().await.unwrap_err();
        assert!(err.is_parse(), "got {err}");
    }

    #[tokio::test]
    async fn leaked_status_line_is_an_invalid_header() {
        // mangled response spotted in the wild: a status line where a
        // header should be
        let mut r = reader(b"X-First: y\r\nHTTP/1.0 200 OK\r\n");
        r.read_header().await.unwrap();
        let err = r.read_header().await.unwrap_err();
        assert!(err.is_parse(), "got {err}");
    }

    #[tokio::test]
    async fn empty_header_name_is_invalid() {
        let mut r = reader(b": value\r\n");
        let err = r.read_header().await.unwrap_err();
        assert!(err.is_parse(), "got {err}");
    }

    #[tokio::test]
    async fn truncated_header_is_incomplete() {
        let mut r = reader(b"Host: localhost");
        let err = r.read_header().await.unwrap_err();
        assert!(err.is_incomplete(), "got {err}");
    }

    #[tokio::test]
    async fn chunk_size_lines() {
        assert_eq!(reader(b"5\r\n").read_chunk_size().await.unwrap(), 5);
        assert_eq!(reader(b"a\r\n").read_chunk_size().await.unwrap(), 10);
        assert_eq!(reader(b"FF\r\n").read_chunk_size().await.unwrap(), 255);
        assert_eq!(reader(b"0\r\n").read_chunk_size().await.unwrap(), 0);
        // extensions are ignored
        assert_eq!(reader(b"10;name=value\r\n").read_chunk_size().await.unwrap(), 16);

        let err = reader(b"xyz\r\n").read_chunk_size().await.unwrap_err();
        assert!(err.is_parse(), "got {err}");

        let err = reader(b"10").read_chunk_size().await.unwrap_err();
        assert!(err.is_incomplete(), "got {err}");
    }
}
