//! # Transactions
//!
//! A transaction is immutable once signed: its id is the low 8 bytes of
//! `sha256(signed byte form)`, so any field change after signing changes
//! the id. Block-inclusion fields (`block_id`, `height`, `block_index`)
//! are bookkeeping set at apply time and are not part of the byte form.

use crate::attachment::{Attachment, PrunableSourceCode};
use crate::errors::{TxError, TxResult};
use crate::{PublicKey, Signature};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use xel_crypto::{account_id, hash_to_id, sha256, verify_raw, Ed25519KeyPair, Hash};

/// A chain transaction with its type-specific attachment.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's Ed25519 public key.
    pub sender_public_key: PublicKey,
    /// Recipient account id, for recipient-bearing kinds.
    pub recipient_id: Option<u64>,
    /// Amount transferred or escrowed, in base units.
    pub amount: u64,
    /// Fee paid to the block forger, in base units.
    pub fee: u64,
    /// Creation timestamp (seconds since epoch).
    pub timestamp: u32,
    /// Deadline in minutes after `timestamp` before the transaction expires.
    pub deadline: u16,
    /// Optional full hash of a transaction this one depends on.
    pub referenced_transaction_hash: Option<Hash>,
    /// Type-specific payload.
    pub attachment: Attachment,
    /// Prunable source-code appendix (new-task transactions only).
    pub source_code: Option<PrunableSourceCode>,
    /// Ed25519 signature over the unsigned byte form.
    #[serde_as(as = "Option<Bytes>")]
    pub signature: Option<Signature>,
    /// Id of the block this transaction was confirmed in.
    pub block_id: Option<u64>,
    /// Height this transaction was confirmed at.
    pub height: Option<u32>,
    /// Position within the confirming block.
    pub block_index: Option<u16>,
}

impl Transaction {
    /// Create an unsigned transaction.
    pub fn new(
        sender_public_key: PublicKey,
        recipient_id: Option<u64>,
        amount: u64,
        fee: u64,
        timestamp: u32,
        deadline: u16,
        attachment: Attachment,
    ) -> Self {
        Self {
            sender_public_key,
            recipient_id,
            amount,
            fee,
            timestamp,
            deadline,
            referenced_transaction_hash: None,
            attachment,
            source_code: None,
            signature: None,
            block_id: None,
            height: None,
            block_index: None,
        }
    }

    /// Attach a prunable source-code appendix.
    pub fn with_source_code(mut self, source_code: PrunableSourceCode) -> Self {
        self.source_code = Some(source_code);
        self
    }

    /// Reference another transaction by full hash.
    pub fn with_referenced_hash(mut self, hash: Hash) -> Self {
        self.referenced_transaction_hash = Some(hash);
        self
    }

    /// Numeric account id of the sender.
    pub fn sender_id(&self) -> u64 {
        account_id(&self.sender_public_key)
    }

    /// Consensus byte form (little-endian).
    ///
    /// A missing signature encodes as 64 zero bytes, which is also the
    /// message form the signature is computed over.
    pub fn bytes(&self, include_signature: bool) -> Vec<u8> {
        let (tx_type, subtype) = self.attachment.tag();
        let mut out = Vec::with_capacity(176);
        out.push(tx_type);
        out.push(subtype);
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&self.deadline.to_le_bytes());
        out.extend_from_slice(&self.sender_public_key);
        out.extend_from_slice(&self.recipient_id.unwrap_or(0).to_le_bytes());
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.extend_from_slice(&self.fee.to_le_bytes());
        out.extend_from_slice(&self.referenced_transaction_hash.unwrap_or([0u8; 32]));
        if include_signature {
            match &self.signature {
                Some(signature) => out.extend_from_slice(signature),
                None => out.extend_from_slice(&[0u8; 64]),
            }
        }
        out.extend_from_slice(&self.attachment.to_bytes());
        if let Some(source_code) = &self.source_code {
            out.extend_from_slice(&source_code.to_bytes());
        }
        out
    }

    /// Full SHA-256 hash of the signed byte form.
    pub fn full_hash(&self) -> Hash {
        sha256(&self.bytes(true))
    }

    /// Numeric transaction id; meaningful only once signed.
    pub fn id(&self) -> u64 {
        hash_to_id(&self.full_hash())
    }

    /// Total size of the signed byte form.
    pub fn size(&self) -> usize {
        self.bytes(true).len()
    }

    /// Seconds-since-epoch at which this transaction expires.
    pub fn expiration(&self) -> u32 {
        self.timestamp.saturating_add(u32::from(self.deadline) * 60)
    }

    /// Sign with the sender's keypair.
    pub fn sign(&mut self, keypair: &Ed25519KeyPair) {
        let message = self.bytes(false);
        self.signature = Some(*keypair.sign(&message).as_bytes());
    }

    /// Verify the signature against the sender's public key.
    pub fn verify_signature(&self) -> TxResult<()> {
        let signature = self.signature.ok_or(TxError::InvalidSignature)?;
        verify_raw(&self.sender_public_key, &self.bytes(false), &signature)
            .map_err(|_| TxError::InvalidSignature)
    }
}
