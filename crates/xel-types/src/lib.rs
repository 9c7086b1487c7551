//! # xel-types
//!
//! Shared domain entities for the XEL consensus core.
//!
//! ## Clusters
//!
//! - **Chain**: [`Block`], [`Transaction`], byte forms and id derivation
//! - **Work market**: [`Attachment`] wire codec, [`PrunableSourceCode`],
//!   submission content hashing
//! - **Validation**: [`TxError`] with its three-severity [`TxErrorKind`]
//! - **Consensus parameters**: the [`constants`] module
//!
//! Every byte form in this crate is fixed little-endian; transaction and
//! block ids are derived from those bytes, so they are consensus-critical
//! and hand-written rather than serde-derived.

pub mod attachment;
pub mod block;
pub mod constants;
pub mod errors;
pub mod transaction;

pub use attachment::{content_hash, Attachment, PrunableSourceCode};
pub use block::Block;
pub use errors::{TxError, TxErrorKind, TxResult};
pub use transaction::Transaction;

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Numeric account identifier (low 8 bytes of `sha256(public key)`).
pub type AccountId = u64;

/// Numeric block or transaction identifier.
pub type EntityId = u64;

/// Chain height.
pub type Height = u32;
