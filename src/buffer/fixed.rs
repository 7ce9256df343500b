//! Fixed-width byte fields with truncate-on-write semantics.

use std::fmt;

use serde::{Serialize, Serializer};

/// A byte string stored inline in `N` bytes plus an explicit length.
///
/// Writes longer than `N` are cut at exactly `N` bytes. The cut is byte-wise,
/// so a multi-byte UTF-8 sequence may be split at the boundary.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedBytes<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> FixedBytes<N> {
    /// Maximum number of bytes retained.
    pub const CAPACITY: usize = N;

    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    /// Copy up to `N` bytes of `src`. Returns the field and whether it was truncated.
    pub fn truncating(src: &[u8]) -> (Self, bool) {
        let len = src.len().min(N);
        let mut buf = [0u8; N];
        buf[..len].copy_from_slice(&src[..len]);
        (Self { buf, len }, src.len() > N)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// The stored bytes as text, replacing any split code point.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The whole backing array, including unused trailing zero bytes.
    pub fn raw(&self) -> &[u8; N] {
        &self.buf
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for FixedBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl<const N: usize> Serialize for FixedBytes<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl<const N: usize> PartialEq<&str> for FixedBytes<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}
