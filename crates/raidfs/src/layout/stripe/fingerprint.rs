//! Fingerprints compared by the verified-read vote.

use sha2::{Digest, Sha256 as Sha256Hasher};

/// Fingerprint reduces the bytes a mirror returned to a comparable value.
pub trait Fingerprint {
    type Value: Eq + Clone + std::fmt::Debug;

    /// fingerprint computes the value for one mirror's bytes.
    ///
    /// # Arguments
    /// * `bytes` - The bytes read from one disk.
    fn fingerprint(&self, bytes: &[u8]) -> Self::Value;
}

/// Additive sums every byte as a signed char into a wrapping 32-bit total.
#[derive(Clone, Copy, Debug, Default)]
pub struct Additive;

impl Fingerprint for Additive {
    type Value = i32;

    fn fingerprint(&self, bytes: &[u8]) -> i32 {
        bytes
            .iter()
            .fold(0i32, |acc, b| acc.wrapping_add(i32::from(*b as i8)))
    }
}

/// Sha256 detects reorderings and compensating changes the additive sum misses.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256;

impl Fingerprint for Sha256 {
    type Value = [u8; 32];

    fn fingerprint(&self, bytes: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256Hasher::new();
        hasher.update(bytes);
        hasher.finalize().into()
    }
}
