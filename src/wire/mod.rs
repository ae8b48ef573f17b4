//! Wire-level encoding and decoding of HTTP/1.x messages.
//!
//! [`writer::Writer`] serializes one message at a time through a strict
//! phase sequence; [`reader::Reader`] parses a response stream; and
//! [`framing`] decides, from parsed headers alone, where a body ends.

pub mod framing;
pub mod reader;
pub mod writer;

pub use framing::{body_length, close_requested, BodyLength};
pub use reader::Reader;
pub use writer::{Phase, Writer};
