//! # Transaction Attachments
//!
//! Type-specific payload carried by each transaction, plus the optional
//! prunable source-code appendix bound to new tasks.
//!
//! The byte forms here are consensus-critical: transaction ids and
//! signatures are computed over them, so encoding is hand-written
//! little-endian with explicit lengths rather than going through serde.

use crate::constants::{MAX_INTS_FOR_WORK, MAX_TITLE_LENGTH, MIN_INTS_FOR_WORK};
use crate::errors::{TxError, TxResult};
use serde::{Deserialize, Serialize};
use xel_crypto::{sha256, Hash, Sha256Hasher};

/// Type tag for plain currency transfers.
pub const TYPE_PAYMENT: u8 = 0;
/// Type tag for all work-market operations.
pub const TYPE_WORK_CONTROL: u8 = 3;

/// Subtype tags under [`TYPE_PAYMENT`].
pub const SUBTYPE_ORDINARY_PAYMENT: u8 = 0;
/// Subtype tags under [`TYPE_WORK_CONTROL`].
pub const SUBTYPE_NEW_TASK: u8 = 0;
/// Block-assembly cancellation settlement.
pub const SUBTYPE_CANCEL_TASK: u8 = 1;
/// Proof-of-work submission.
pub const SUBTYPE_PROOF_OF_WORK: u8 = 2;
/// Bounty submission.
pub const SUBTYPE_BOUNTY: u8 = 3;
/// Block-assembly bounty/pow payout settlement.
pub const SUBTYPE_BOUNTY_PAYOUT: u8 = 4;
/// User-initiated cancellation request.
pub const SUBTYPE_CANCEL_TASK_REQUEST: u8 = 5;
/// Bounty hash pre-commitment.
pub const SUBTYPE_BOUNTY_ANNOUNCEMENT: u8 = 6;

/// The only task-code language accepted on chain (ElasticPL).
pub const LANGUAGE_ELASTIC_PL: u8 = 0x01;

/// Type-specific transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attachment {
    /// Plain currency transfer; no extra payload.
    OrdinaryPayment,
    /// Post a new funded task.
    NewTask {
        /// Human-readable task title, at most 255 bytes of UTF-8.
        title: String,
        /// Task lifetime in blocks from the creation height.
        deadline: u16,
        /// Maximum accepted bounty submissions.
        bounty_limit: u32,
        /// Reward per accepted proof-of-work unit, in base units.
        xel_per_pow: u64,
        /// Share of the funding amount routed to the pow fund (percent).
        percentage_pow_fund: u8,
    },
    /// Block-assembly settlement closing a task and refunding its creator.
    CancelTask {
        /// Task being closed.
        work_id: u64,
    },
    /// Proof-of-work submission against an open task.
    ProofOfWork {
        /// Task being worked on.
        work_id: u64,
        /// Input vector consumed by the task's code.
        input: Vec<i32>,
    },
    /// Bounty submission against an open task.
    Bounty {
        /// Task being worked on.
        work_id: u64,
        /// Input vector consumed by the task's code.
        input: Vec<i32>,
    },
    /// Block-assembly settlement paying a recorded winner.
    BountyPayout {
        /// Task the payout settles.
        work_id: u64,
        /// Submission being paid.
        submission_id: u64,
    },
    /// Task creator asking for cancellation.
    CancelTaskRequest {
        /// Task to cancel.
        work_id: u64,
    },
    /// Pre-commitment to a bounty content hash before revealing the input.
    BountyAnnouncement {
        /// Task the announcement targets.
        work_id: u64,
        /// The committed content hash (at most 32 bytes).
        hash_announced: Vec<u8>,
    },
}

impl Attachment {
    /// The on-wire (type, subtype) tag.
    pub fn tag(&self) -> (u8, u8) {
        match self {
            Attachment::OrdinaryPayment => (TYPE_PAYMENT, SUBTYPE_ORDINARY_PAYMENT),
            Attachment::NewTask { .. } => (TYPE_WORK_CONTROL, SUBTYPE_NEW_TASK),
            Attachment::CancelTask { .. } => (TYPE_WORK_CONTROL, SUBTYPE_CANCEL_TASK),
            Attachment::ProofOfWork { .. } => (TYPE_WORK_CONTROL, SUBTYPE_PROOF_OF_WORK),
            Attachment::Bounty { .. } => (TYPE_WORK_CONTROL, SUBTYPE_BOUNTY),
            Attachment::BountyPayout { .. } => (TYPE_WORK_CONTROL, SUBTYPE_BOUNTY_PAYOUT),
            Attachment::CancelTaskRequest { .. } => {
                (TYPE_WORK_CONTROL, SUBTYPE_CANCEL_TASK_REQUEST)
            }
            Attachment::BountyAnnouncement { .. } => {
                (TYPE_WORK_CONTROL, SUBTYPE_BOUNTY_ANNOUNCEMENT)
            }
        }
    }

    /// Serialize to the consensus byte form (little-endian, explicit lengths).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Attachment::OrdinaryPayment => {}
            Attachment::NewTask {
                title,
                deadline,
                bounty_limit,
                xel_per_pow,
                percentage_pow_fund,
            } => {
                out.extend_from_slice(&(title.len() as u16).to_le_bytes());
                out.extend_from_slice(title.as_bytes());
                out.extend_from_slice(&deadline.to_le_bytes());
                out.extend_from_slice(&bounty_limit.to_le_bytes());
                out.extend_from_slice(&xel_per_pow.to_le_bytes());
                out.push(*percentage_pow_fund);
            }
            Attachment::CancelTask { work_id } | Attachment::CancelTaskRequest { work_id } => {
                out.extend_from_slice(&work_id.to_le_bytes());
            }
            Attachment::ProofOfWork { work_id, input } | Attachment::Bounty { work_id, input } => {
                out.extend_from_slice(&work_id.to_le_bytes());
                out.push(input.len() as u8);
                for value in input {
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }
            Attachment::BountyPayout {
                work_id,
                submission_id,
            } => {
                out.extend_from_slice(&work_id.to_le_bytes());
                out.extend_from_slice(&submission_id.to_le_bytes());
            }
            Attachment::BountyAnnouncement {
                work_id,
                hash_announced,
            } => {
                out.extend_from_slice(&work_id.to_le_bytes());
                out.extend_from_slice(&(hash_announced.len() as u16).to_le_bytes());
                out.extend_from_slice(hash_announced);
            }
        }
        out
    }

    /// Parse the consensus byte form for a (type, subtype) tag.
    pub fn parse(tx_type: u8, subtype: u8, bytes: &[u8]) -> TxResult<Self> {
        let mut reader = ByteReader::new(bytes);
        let attachment = match (tx_type, subtype) {
            (TYPE_PAYMENT, SUBTYPE_ORDINARY_PAYMENT) => Attachment::OrdinaryPayment,
            (TYPE_WORK_CONTROL, SUBTYPE_NEW_TASK) => {
                let title_len = reader.read_u16()? as usize;
                if title_len > MAX_TITLE_LENGTH {
                    return Err(TxError::TitleLength { len: title_len });
                }
                let title = String::from_utf8(reader.read_bytes(title_len)?.to_vec())
                    .map_err(|_| TxError::MalformedAttachment("title is not UTF-8".into()))?;
                Attachment::NewTask {
                    title,
                    deadline: reader.read_u16()?,
                    bounty_limit: reader.read_u32()?,
                    xel_per_pow: reader.read_u64()?,
                    percentage_pow_fund: reader.read_u8()?,
                }
            }
            (TYPE_WORK_CONTROL, SUBTYPE_CANCEL_TASK) => Attachment::CancelTask {
                work_id: reader.read_u64()?,
            },
            (TYPE_WORK_CONTROL, SUBTYPE_CANCEL_TASK_REQUEST) => Attachment::CancelTaskRequest {
                work_id: reader.read_u64()?,
            },
            (TYPE_WORK_CONTROL, SUBTYPE_PROOF_OF_WORK)
            | (TYPE_WORK_CONTROL, SUBTYPE_BOUNTY) => {
                let work_id = reader.read_u64()?;
                let count = reader.read_u8()? as usize;
                if count > MAX_INTS_FOR_WORK {
                    return Err(TxError::InputVectorLength { len: count });
                }
                let mut input = Vec::with_capacity(count);
                for _ in 0..count {
                    input.push(reader.read_i32()?);
                }
                if subtype == SUBTYPE_PROOF_OF_WORK {
                    Attachment::ProofOfWork { work_id, input }
                } else {
                    Attachment::Bounty { work_id, input }
                }
            }
            (TYPE_WORK_CONTROL, SUBTYPE_BOUNTY_PAYOUT) => Attachment::BountyPayout {
                work_id: reader.read_u64()?,
                submission_id: reader.read_u64()?,
            },
            (TYPE_WORK_CONTROL, SUBTYPE_BOUNTY_ANNOUNCEMENT) => {
                let work_id = reader.read_u64()?;
                let hash_len = reader.read_u16()? as usize;
                if hash_len > 32 {
                    return Err(TxError::AnnouncementHashLength { len: hash_len });
                }
                Attachment::BountyAnnouncement {
                    work_id,
                    hash_announced: reader.read_bytes(hash_len)?.to_vec(),
                }
            }
            _ => return Err(TxError::UnknownTransactionType { tx_type, subtype }),
        };
        reader.finish()?;
        Ok(attachment)
    }

    /// Structural checks that need no chain state.
    pub fn validate_structure(&self) -> TxResult<()> {
        match self {
            Attachment::NewTask {
                title,
                deadline,
                bounty_limit,
                xel_per_pow,
                percentage_pow_fund,
            } => {
                if title.is_empty() || title.len() > MAX_TITLE_LENGTH {
                    return Err(TxError::TitleLength { len: title.len() });
                }
                if *deadline < crate::constants::MIN_WORK_DEADLINE
                    || *deadline > crate::constants::MAX_WORK_DEADLINE
                {
                    return Err(TxError::WorkDeadlineOutOfBounds {
                        deadline: *deadline,
                    });
                }
                if *bounty_limit < crate::constants::MIN_BOUNTY_LIMIT
                    || *bounty_limit > crate::constants::MAX_BOUNTY_LIMIT
                {
                    return Err(TxError::BountyLimitOutOfBounds {
                        limit: *bounty_limit,
                    });
                }
                if *xel_per_pow < crate::constants::MIN_XEL_PER_POW
                    || *xel_per_pow > crate::constants::MAX_WORK_POW_REWARD
                {
                    return Err(TxError::RewardOutOfBounds {
                        xel_per_pow: *xel_per_pow,
                    });
                }
                if *percentage_pow_fund > 100 {
                    return Err(TxError::MalformedAttachment(format!(
                        "pow fund percentage {percentage_pow_fund} exceeds 100"
                    )));
                }
                Ok(())
            }
            Attachment::ProofOfWork { input, .. } | Attachment::Bounty { input, .. } => {
                if input.len() < MIN_INTS_FOR_WORK || input.len() > MAX_INTS_FOR_WORK {
                    return Err(TxError::InputVectorLength { len: input.len() });
                }
                Ok(())
            }
            Attachment::BountyAnnouncement { hash_announced, .. } => {
                if hash_announced.is_empty() || hash_announced.len() > 32 {
                    return Err(TxError::AnnouncementHashLength {
                        len: hash_announced.len(),
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Anti-replay content hash over (work id, input vector, submission kind).
///
/// The kind flag keeps a proof-of-work input from colliding with the same
/// input submitted as a bounty.
pub fn content_hash(work_id: u64, input: &[i32], is_pow: bool) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update(&work_id.to_le_bytes());
    for value in input {
        hasher.update(&value.to_le_bytes());
    }
    hasher.update(&[is_pow as u8]);
    hasher.finalize()
}

/// Prunable source-code appendix carried by new-task transactions.
///
/// The chain commits to `sha256(source)` only; the source itself may be
/// pruned later, after which the hash keeps the commitment verifiable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrunableSourceCode {
    /// The submitted task code.
    pub source: Vec<u8>,
    /// Language tag; only [`LANGUAGE_ELASTIC_PL`] is accepted.
    pub language: u8,
}

impl PrunableSourceCode {
    /// Create a new appendix.
    pub fn new(source: Vec<u8>, language: u8) -> Self {
        Self { source, language }
    }

    /// Commitment hash over the source bytes.
    pub fn source_hash(&self) -> Hash {
        sha256(&self.source)
    }

    /// Byte form folded into the owning transaction's signed bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 32);
        out.push(self.language);
        out.extend_from_slice(&self.source_hash());
        out
    }

    /// Structural check: language must be supported.
    pub fn validate(&self) -> TxResult<()> {
        if self.language != LANGUAGE_ELASTIC_PL {
            return Err(TxError::UnsupportedLanguage {
                language: self.language,
            });
        }
        Ok(())
    }
}

/// Bounds-checked little-endian reader for attachment byte forms.
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> TxResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| TxError::MalformedAttachment("truncated attachment".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> TxResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> TxResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> TxResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&mut self) -> TxResult<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self) -> TxResult<u64> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    fn finish(self) -> TxResult<()> {
        if self.pos != self.bytes.len() {
            return Err(TxError::MalformedAttachment(
                "trailing bytes after attachment".into(),
            ));
        }
        Ok(())
    }
}
