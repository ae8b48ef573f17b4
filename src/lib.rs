//! # Tether
//!
//! Layered HTTP/1.x client.
//!
//! The bottom layer ([`wire`]) encodes requests through a strict
//! request-line → headers → body phase sequence and decodes response
//! streams, resolving body framing from Content-Length, chunked transfer
//! encoding, or connection close. The middle layer ([`codec`]) composes
//! both directions into per-connection write-request / read-response
//! operations. Above that, a caching dialer ([`pool`]) hands idle
//! connections back out per (scheme, host), and [`client::Client`] offers
//! buffered convenience requests with redirect following.

pub mod client;
pub mod codec;
pub mod dialer;
pub mod error;
pub mod headers;
pub mod pool;
pub mod request;
pub mod status;
pub mod timeouts;
pub mod transport;
pub mod version;
pub mod wire;

// Re-exports
pub use client::Client;
pub use dialer::{Conn, Dialer, TcpDialer};
pub use error::{Error, Result};
pub use headers::Header;
pub use pool::CachingDialer;
pub use request::{Body, Request};
pub use status::Status;
pub use timeouts::Timeouts;
pub use version::Version;
