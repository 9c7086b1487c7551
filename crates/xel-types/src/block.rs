//! # Blocks
//!
//! Block identity is the low 8 bytes of `sha256(byte form)` with the
//! signature included; the signature itself is computed over the byte
//! form without it. The byte form is fixed little-endian, so every node
//! derives identical ids from identical blocks.

use crate::transaction::Transaction;
use crate::{PublicKey, Signature, U256};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use xel_crypto::{hash_to_id, sha256, verify_raw, Ed25519KeyPair, Hash, Sha256Hasher};

/// A block with its ordered transactions and chain bookkeeping.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Protocol version.
    pub version: u32,
    /// Forge timestamp (seconds since epoch).
    pub timestamp: u32,
    /// Id of the predecessor block (0 for genesis).
    pub previous_block_id: u64,
    /// Forger's Ed25519 public key.
    pub generator_public_key: PublicKey,
    /// Proof-of-stake generation signature chain value.
    pub generation_signature: Hash,
    /// SHA-256 over the concatenated transaction byte forms.
    pub payload_hash: Hash,
    /// Full hash of the predecessor block.
    pub previous_block_hash: Hash,
    /// Sum of transaction amounts, in base units.
    pub total_amount: u64,
    /// Sum of transaction fees, in base units.
    pub total_fee: u64,
    /// Total byte length of the transaction payload.
    pub payload_length: u32,
    /// Transactions in consensus apply order.
    pub transactions: Vec<Transaction>,
    /// Proof-of-stake difficulty parameter as of this block.
    pub base_target: u64,
    /// Running chain-selection weight.
    pub cumulative_difficulty: U256,
    /// Chain height (0 for genesis).
    pub height: u32,
    /// Forger's signature over the byte form without it.
    #[serde_as(as = "Option<Bytes>")]
    pub signature: Option<Signature>,
}

impl Block {
    /// Consensus byte form (little-endian).
    pub fn bytes(&self, include_signature: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 4 + 8 + 4 + 8 + 8 + 4 + 32 * 4 + 64);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&self.previous_block_id.to_le_bytes());
        out.extend_from_slice(&(self.transactions.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.total_amount.to_le_bytes());
        out.extend_from_slice(&self.total_fee.to_le_bytes());
        out.extend_from_slice(&self.payload_length.to_le_bytes());
        out.extend_from_slice(&self.payload_hash);
        out.extend_from_slice(&self.generator_public_key);
        out.extend_from_slice(&self.generation_signature);
        out.extend_from_slice(&self.previous_block_hash);
        if include_signature {
            match &self.signature {
                Some(signature) => out.extend_from_slice(signature),
                None => out.extend_from_slice(&[0u8; 64]),
            }
        }
        out
    }

    /// Full SHA-256 hash of the signed byte form.
    pub fn full_hash(&self) -> Hash {
        sha256(&self.bytes(true))
    }

    /// Numeric block id; meaningful only once signed.
    pub fn id(&self) -> u64 {
        hash_to_id(&self.full_hash())
    }

    /// Numeric account id of the forger.
    pub fn generator_id(&self) -> u64 {
        xel_crypto::account_id(&self.generator_public_key)
    }

    /// Sign with the forger's keypair.
    pub fn sign(&mut self, keypair: &Ed25519KeyPair) {
        let message = self.bytes(false);
        self.signature = Some(*keypair.sign(&message).as_bytes());
    }

    /// Verify the forger's signature.
    pub fn verify_signature(&self) -> bool {
        match &self.signature {
            Some(signature) => {
                verify_raw(&self.generator_public_key, &self.bytes(false), signature).is_ok()
            }
            None => false,
        }
    }

    /// Payload hash over the block's transactions, in order.
    pub fn compute_payload_hash(transactions: &[Transaction]) -> (Hash, u32) {
        let mut hasher = Sha256Hasher::new();
        let mut length = 0u32;
        for tx in transactions {
            let bytes = tx.bytes(true);
            length += bytes.len() as u32;
            hasher.update(&bytes);
        }
        (hasher.finalize(), length)
    }
}
