//! HTTP headers as ordered key/value pairs.
//!
//! Headers keep their wire order and spelling. Lookups compare names
//! case-insensitively; repeated names stay distinct entries rather than
//! being merged, since order carries meaning for multi-valued headers.

/// A single header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name match.
    pub fn is(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name)
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Header {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// First value for `name`, comparing names case-insensitively.
pub fn value_of<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.is(name))
        .map(|h| h.value.as_str())
}

/// Every value for `name`, in wire order.
pub fn values_of<'a>(headers: &'a [Header], name: &str) -> Vec<&'a str> {
    headers
        .iter()
        .filter(|h| h.is(name))
        .map(|h| h.value.as_str())
        .collect()
}
