//! Timeout configuration.
//!
//! All limits are optional; `None` lets the operation block indefinitely.
//! A limit that expires surfaces as [`Error::Timeout`], which is fatal for
//! the connection like any other I/O failure.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Per-phase time limits carried by dialers and connections.
#[derive(Clone, Debug, Default)]
pub struct Timeouts {
    /// Limit on establishing the transport connection.
    pub connect: Option<Duration>,

    /// Limit on each read operation: the response head, and every body
    /// read individually.
    pub read: Option<Duration>,

    /// Limit on writing one complete request.
    pub write: Option<Duration>,

    /// Absolute limit for a whole request/response exchange.
    pub total: Option<Duration>,
}

impl Timeouts {
    /// No limits anywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sensible defaults for API-style request/response traffic.
    pub fn api_defaults() -> Self {
        Self {
            connect: Some(Duration::from_secs(10)),
            read: Some(Duration::from_secs(30)),
            write: Some(Duration::from_secs(30)),
            total: Some(Duration::from_secs(120)),
        }
    }

    /// Set connect timeout.
    pub fn connect(mut self, limit: Duration) -> Self {
        self.connect = Some(limit);
        self
    }

    /// Set read timeout.
    pub fn read(mut self, limit: Duration) -> Self {
        self.read = Some(limit);
        self
    }

    /// Set write timeout.
    pub fn write(mut self, limit: Duration) -> Self {
        self.write = Some(limit);
        self
    }

    /// Set total exchange deadline.
    pub fn total(mut self, limit: Duration) -> Self {
        self.total = Some(limit);
        self
    }
}

/// Awaits `fut`, failing with [`Error::Timeout`] if `limit` elapses first.
pub(crate) async fn maybe_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(limit)),
        },
        None => fut.await,
    }
}
