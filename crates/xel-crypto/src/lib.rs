//! # xel-crypto
//!
//! Cryptographic primitives consumed by the consensus core.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Block/transaction ids, payload hashes, generation signatures |
//! | `signatures` | Ed25519 | Block and transaction signing |
//!
//! Entity ids on this chain are *numeric*: the low 8 bytes of a SHA-256
//! digest reinterpreted as an unsigned 64-bit value. `hashing::hash_to_id`
//! is the single place that reinterpretation lives.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{account_id, hash_to_id, sha256, sha256_many, Hash, Sha256Hasher};
pub use signatures::{verify_raw, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
