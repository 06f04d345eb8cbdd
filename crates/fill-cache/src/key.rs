//! Cache key derivation

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a rendered key (hex-encoded SHA-256)
pub const KEY_LEN: usize = 64;

/// Opaque, fixed-length identifier of a `(source, width, height)` triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a source rendered at `width` x `height`.
    ///
    /// The source is length-prefixed and the dimensions are fixed-width, so
    /// `("ab", 1, 23)` and `("ab1", 2, 3)` hash different byte strings.
    pub fn derive(source: &str, width: u32, height: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((source.len() as u64).to_be_bytes());
        hasher.update(source.as_bytes());
        hasher.update(width.to_be_bytes());
        hasher.update(height.to_be_bytes());
        CacheKey(hex::encode(hasher.finalize()))
    }

    /// Parse a rendered key, e.g. a file name found in the cache tree
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == KEY_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| CacheKey(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
