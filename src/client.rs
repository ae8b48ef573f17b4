//! High-level request/response client.
//!
//! Buffers complete responses, injects the Host header, follows 301/302
//! redirects when asked to, and applies the release-or-close discipline the
//! connection pool relies on: a connection goes back to the pool only after
//! its response body has been drained and neither side demanded closure.

use std::io::Read;

use bytes::Bytes;
use url::Url;

use crate::codec::Response as WireResponse;
use crate::dialer::{Dialer, TcpDialer};
use crate::error::{Error, Result};
use crate::headers::{value_of, Header};
use crate::pool::CachingDialer;
use crate::request::{Body, Request};
use crate::status::Status;
use crate::version::Version;

const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// High-level HTTP client over any [`Dialer`].
///
/// Constructed explicitly by the embedding application; there is no
/// process-wide default instance. Methods may be called concurrently from
/// any number of tasks.
pub struct Client<D = CachingDialer<TcpDialer>> {
    dialer: D,
    /// Follow 301/302 responses to their Location target.
    pub follow_redirects: bool,
    /// Redirect chain length at which following gives up.
    pub max_redirects: u32,
}

impl Client<CachingDialer<TcpDialer>> {
    /// Client over a plain TCP dialer wrapped in a connection cache.
    pub fn new() -> Self {
        Self::with_dialer(CachingDialer::new(TcpDialer::new()))
    }
}

impl Default for Client<CachingDialer<TcpDialer>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dialer + Sync> Client<D> {
    pub fn with_dialer(dialer: D) -> Self {
        Self {
            dialer,
            follow_redirects: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// Sends `method` to `url` and buffers the complete response.
    ///
    /// In-memory bodies are replayed across redirects; a streaming body
    /// cannot be, so a redirect to a streamed request is returned as-is.
    pub async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &[Header],
        body: Body,
    ) -> Result<Response> {
        let mut url = Url::parse(url)?;
        let mut pending = body;
        let mut redirects = 0u32;
        loop {
            let (send, replay) = match pending {
                Body::Empty => (Body::Empty, Some(Body::Empty)),
                Body::Full(bytes) => (Body::Full(bytes.clone()), Some(Body::Full(bytes))),
                Body::Streaming(stream) => (Body::Streaming(stream), None),
            };
            let response = self.exchange(method, &url, headers, send).await?;
            if !(self.follow_redirects && response.status.is_redirect()) {
                return Ok(response);
            }
            let Some(next) = replay else {
                return Ok(response);
            };
            pending = next;
            redirects += 1;
            if redirects > self.max_redirects {
                return Err(Error::RedirectLimit { count: redirects });
            }
            let location = response
                .header("Location")
                .ok_or_else(|| Error::InvalidRedirect("response carried no Location".into()))?;
            url = url
                .join(location)
                .map_err(|_| Error::InvalidRedirect(location.to_string()))?;
        }
    }

    /// One request/response exchange on one connection.
    async fn exchange(
        &self,
        method: &str,
        url: &Url,
        headers: &[Header],
        body: Body,
    ) -> Result<Response> {
        let scheme = url.scheme();
        let host = url
            .host_str()
            .ok_or_else(|| Error::MissingHost(url.to_string()))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let mut path = url.path().to_string();
        if path.is_empty() {
            path.push('/');
        }
        if let Some(query) = url.query() {
            if !query.is_empty() {
                path.push('?');
                path.push_str(query);
            }
        }

        let mut request = Request::new(method, path).header("Host", host.clone());
        request.headers.extend(headers.iter().cloned());
        request.body = body;

        let mut conn = self.dialer.dial(scheme, &host).await?;
        // any early return from here drops the connection, closing it; only
        // the clean path below releases it for reuse
        conn.write_request(request).await?;
        let WireResponse {
            version,
            status,
            headers,
            mut body,
        } = conn.read_response().await?;
        let bytes = body.bytes().await?;
        drop(body);

        if conn.is_reusable() {
            conn.release();
        } else {
            conn.close().await.ok();
        }

        Ok(Response {
            version,
            status,
            headers,
            body: bytes,
        })
    }

    /// Sends a GET request.
    pub async fn get(&self, url: &str, headers: &[Header]) -> Result<Response> {
        self.request("GET", url, headers, Body::Empty).await
    }

    /// Sends a POST request with the given body.
    pub async fn post(
        &self,
        url: &str,
        headers: &[Header],
        body: impl Into<Body>,
    ) -> Result<Response> {
        self.request("POST", url, headers, body.into()).await
    }

    /// Sends a PUT request with the given body.
    pub async fn put(
        &self,
        url: &str,
        headers: &[Header],
        body: impl Into<Body>,
    ) -> Result<Response> {
        self.request("PUT", url, headers, body.into()).await
    }

    /// Sends a PATCH request with the given body.
    pub async fn patch(
        &self,
        url: &str,
        headers: &[Header],
        body: impl Into<Body>,
    ) -> Result<Response> {
        self.request("PATCH", url, headers, body.into()).await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, url: &str, headers: &[Header]) -> Result<Response> {
        self.request("DELETE", url, headers, Body::Empty).await
    }
}

/// A fully buffered response.
#[derive(Debug)]
pub struct Response {
    pub version: Version,
    pub status: Status,
    pub headers: Vec<Header>,
    body: Bytes,
}

impl Response {
    /// Raw body bytes as received, before any content decoding.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// First value of `name`, comparing names case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        value_of(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.header("Content-Encoding")
    }

    /// Body with any gzip or deflate Content-Encoding reversed.
    pub fn decoded_body(&self) -> Result<Bytes> {
        match self
            .content_encoding()
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("gzip") | Some("x-gzip") => decode_gzip(&self.body),
            Some("deflate") => decode_deflate(&self.body),
            _ => Ok(self.body.clone()),
        }
    }

    /// Decoded body as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        let decoded = self.decoded_body()?;
        String::from_utf8(decoded.to_vec())
            .map_err(|e| Error::Decompression(format!("UTF-8 decode error: {e}")))
    }

    /// Decoded body deserialized as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.decoded_body()?).map_err(Error::from)
    }
}

fn decode_gzip(data: &[u8]) -> Result<Bytes> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| Error::Decompression(format!("gzip: {e}")))?;
    Ok(Bytes::from(decoded))
}

fn decode_deflate(data: &[u8]) -> Result<Bytes> {
    let mut decoded = Vec::new();
    if flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut decoded)
        .is_ok()
    {
        return Ok(Bytes::from(decoded));
    }
    decoded.clear();
    flate2::read::DeflateDecoder::new(data)
        .read_to_end(&mut decoded)
        .map_err(|e| Error::Decompression(format!("deflate: {e}")))?;
    Ok(Bytes::from(decoded))
}
