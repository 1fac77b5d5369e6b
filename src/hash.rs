//! Archive content hashing
//!
//! Used to derive the default unpack directory name. SHA-256 keeps the
//! digest stable across platforms and runs; only a short prefix is kept
//! since the name just needs to distinguish archive contents.

use sha2::{Digest, Sha256};

/// Hex chars kept from the digest
const SHORT_LEN: usize = 16;

/// Compute a short, stable content hash for the given bytes.
///
/// # Example
///
/// ```
/// use aggr::hash::short_hash;
///
/// let digest = short_hash(b"Hello, World!");
/// assert_eq!(digest.len(), 16);
/// assert_eq!(digest, short_hash(b"Hello, World!"));
/// ```
pub fn short_hash(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut hex = String::with_capacity(SHORT_LEN);
    for byte in digest.iter().take(SHORT_LEN / 2) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
