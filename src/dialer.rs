//! Dialing and the connection surface.

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::codec::{Codec, Response};
use crate::error::{Error, Result};
use crate::pool::PoolTag;
use crate::request::Request;
use crate::timeouts::{maybe_timeout, Timeouts};
use crate::transport::BoxedTransport;

/// Dials remote HTTP servers.
///
/// Implemented both by plain transport dialers ([`TcpDialer`]) and by the
/// caching decorator ([`crate::pool::CachingDialer`]), which prefers handing
/// out idle connections before opening new ones.
pub trait Dialer {
    /// Establishes (or hands back) a connection to `host` for `scheme`.
    fn dial(&self, scheme: &str, host: &str) -> impl Future<Output = Result<Conn>> + Send;
}

/// Plain TCP dialer for the `http` scheme.
///
/// A bare host gets the scheme's default port appended. Other schemes are
/// rejected; TLS and any other transport participate by implementing
/// [`Dialer`] themselves.
#[derive(Debug, Clone, Default)]
pub struct TcpDialer {
    pub timeouts: Timeouts,
}

impl TcpDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }
}

impl Dialer for TcpDialer {
    async fn dial(&self, scheme: &str, host: &str) -> Result<Conn> {
        let scheme = scheme.to_ascii_lowercase();
        let port = match scheme.as_str() {
            "http" => 80u16,
            _ => return Err(Error::UnsupportedScheme(scheme)),
        };
        let addr = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:{port}")
        };
        tracing::debug!(%addr, "dialing");
        let stream = maybe_timeout(self.timeouts.connect, async {
            Ok(TcpStream::connect(&addr).await?)
        })
        .await?;
        Ok(Conn::new(Box::new(stream), self.timeouts.clone()))
    }
}

/// A live connection to one origin: the message codec over a boxed
/// transport, plus — when handed out by a caching dialer — the tag used to
/// return it to the idle pool.
///
/// A checked-out connection is exclusively owned by its holder until
/// [`Conn::release`] or [`Conn::close`]; exchanges on it are strictly
/// sequential.
pub struct Conn {
    codec: Codec<BoxedTransport>,
    pool: Option<PoolTag>,
}

impl std::fmt::Debug for Conn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conn")
            .field("pooled", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

impl Conn {
    /// Wraps an established transport stream.
    pub fn new(transport: BoxedTransport, timeouts: Timeouts) -> Self {
        Self {
            codec: Codec::with_timeouts(transport, timeouts),
            pool: None,
        }
    }

    pub(crate) fn attach_pool(&mut self, tag: PoolTag) {
        self.pool = Some(tag);
    }

    /// See [`Codec::write_request`].
    pub async fn write_request(&mut self, req: Request) -> Result<()> {
        self.codec.write_request(req).await
    }

    /// See [`Codec::read_response`]. The response borrows this connection
    /// until dropped.
    pub async fn read_response(&mut self) -> Result<Response<'_, BoxedTransport>> {
        self.codec.read_response().await
    }

    /// True when the previous exchange left the stream clean: response body
    /// drained and no closure demanded by either side.
    pub fn is_reusable(&self) -> bool {
        self.codec.is_reusable()
    }

    /// Limits every read operation: the response head and each body read.
    pub fn set_read_timeout(&mut self, limit: Option<Duration>) {
        self.codec.timeouts_mut().read = limit;
    }

    /// Limits writing one complete request.
    pub fn set_write_timeout(&mut self, limit: Option<Duration>) {
        self.codec.timeouts_mut().write = limit;
    }

    /// Applies `limit` to both reads and writes.
    pub fn set_timeout(&mut self, limit: Option<Duration>) {
        let timeouts = self.codec.timeouts_mut();
        timeouts.read = limit;
        timeouts.write = limit;
    }

    /// Returns the connection to its pool for reuse; dropping it closes the
    /// stream when it is not pooled.
    ///
    /// Callers must only release connections whose previous response was
    /// fully drained and did not request closure — the pool stores what it
    /// is given without re-checking. After any write or read error the
    /// connection must be closed instead.
    pub fn release(mut self) {
        if !self.is_reusable() {
            tracing::warn!("releasing a connection that is not marked reusable");
        }
        if let Some(tag) = self.pool.take() {
            let destination = tag.clone();
            self.pool = Some(tag);
            destination.store(self);
        }
    }

    /// Flushes and shuts down the underlying stream.
    pub async fn close(mut self) -> Result<()> {
        self.codec.shutdown().await
    }
}
