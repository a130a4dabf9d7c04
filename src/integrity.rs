//! Content digests for packaged archives

use sha2::{Digest as _, Sha512};
use std::fmt;

pub const ALGORITHM: &str = "sha512";

/// SHA-512 digest of a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub algorithm: &'static str,
    /// Lowercase hex
    pub encoded: String,
    raw: Vec<u8>,
}

impl Digest {
    /// Subresource-Integrity form, `sha512-<base64>`
    pub fn integrity(&self) -> String {
        format!("{}-{}", self.algorithm, base64::encode(&self.raw))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

pub fn digest(bytes: &[u8]) -> Digest {
    let mut hasher = Sha512::new();
    hasher.update(bytes);
    let raw = hasher.finalize().to_vec();
    Digest {
        algorithm: ALGORITHM,
        encoded: hex::encode(&raw),
        raw,
    }
}
