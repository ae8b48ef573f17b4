//! HTTP protocol version.

use std::fmt;

/// HTTP version as a major.minor pair, rendered as `HTTP/{major}.{minor}`.
///
/// Versions order lexicographically, so `Version::HTTP_1_1 > Version::HTTP_1_0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_1_0: Version = Version { major: 1, minor: 0 };
    pub const HTTP_1_1: Version = Version { major: 1, minor: 1 };

    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// True when this version supports chunked transfer encoding and
    /// persistent connections.
    pub fn supports_chunked(&self) -> bool {
        *self >= Self::HTTP_1_1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}
