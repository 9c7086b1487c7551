//! # SHA-256 Hashing
//!
//! Every consensus-relevant digest on this chain is SHA-256: block and
//! transaction ids, payload hashes, generation signatures, and the
//! content hashes that key submission uniqueness.

use sha2::{Digest, Sha256};

/// SHA-256 hash output (256-bit).
pub type Hash = [u8; 32];

/// Stateful SHA-256 hasher.
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Hash {
        self.inner.finalize().into()
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash multiple inputs as one concatenated message.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}

/// Reinterpret a digest as a numeric entity id.
///
/// The id is the low 8 bytes of the digest read as a big-endian unsigned
/// value with byte 7 most significant, which is exactly a little-endian
/// read of `hash[0..8]`.
pub fn hash_to_id(hash: &Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(bytes)
}

/// Derive the numeric account id from an Ed25519 public key.
pub fn account_id(public_key: &[u8; 32]) -> u64 {
    hash_to_id(&sha256(public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256(b"test"), sha256(b"test"));
        assert_ne!(sha256(b"input1"), sha256(b"input2"));
    }

    #[test]
    fn streaming_matches_oneshot() {
        let oneshot = sha256(b"hello world");
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(hasher.finalize(), oneshot);
    }

    #[test]
    fn sha256_known_vector() {
        // sha256("abc")
        let expected = hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
            .unwrap();
        assert_eq!(sha256(b"abc").to_vec(), expected);
    }

    #[test]
    fn hash_to_id_reads_low_bytes_reversed() {
        let mut hash = [0u8; 32];
        hash[0] = 0x01;
        hash[7] = 0xff;
        // byte 7 is the most significant byte of the id
        assert_eq!(hash_to_id(&hash), 0xff00_0000_0000_0001);
    }

    #[test]
    fn account_id_is_stable_per_key() {
        let key = [7u8; 32];
        assert_eq!(account_id(&key), account_id(&key));
        assert_ne!(account_id(&key), account_id(&[8u8; 32]));
    }
}
