//! Transport abstraction.
//!
//! A connection runs over any async duplex byte stream. Streams are boxed
//! behind [`BoxedTransport`] so pooled connections share one concrete type
//! regardless of what dialed them; deadline and shutdown behavior stays
//! with the stream implementation.

use tokio::io::{AsyncRead, AsyncWrite};

/// Byte transport a connection runs over.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin + ?Sized> Transport for T {}

/// Type-erased transport stream.
pub type BoxedTransport = Box<dyn Transport>;
