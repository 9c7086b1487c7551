//! Error types for block consensus.

use xel_types::{EntityId, Height, TxError};

/// Block validation and application errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BlockError {
    #[error("previous block mismatch: expected {expected}, got {got}")]
    UnknownPreviousBlock { expected: EntityId, got: EntityId },

    #[error("block timestamp {block} not after previous {previous}")]
    TimestampNotAfterPrevious { block: u32, previous: u32 },

    #[error("block timestamp {timestamp} too far past current time {current}")]
    FutureTimestamp { timestamp: u32, current: u32 },

    #[error("too many transactions: {count} > {limit}")]
    TooManyTransactions { count: usize, limit: usize },

    #[error("payload length {length} exceeds limit {limit}")]
    PayloadTooLarge { length: usize, limit: usize },

    #[error("payload hash does not match the block's transactions")]
    PayloadHashMismatch,

    #[error("block totals mismatch: declared {declared_amount}/{declared_fee}, computed {amount}/{fee}")]
    TotalsMismatch {
        declared_amount: u64,
        declared_fee: u64,
        amount: u64,
        fee: u64,
    },

    #[error("unsupported block version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid block signature")]
    InvalidBlockSignature,

    #[error("generation signature does not chain from the previous block")]
    InvalidGenerationSignature,

    #[error("generator hit does not meet the stake target")]
    HitAboveTarget,

    #[error("cannot pop to height {target}: chain is at {current}")]
    PopTargetAboveTip { target: Height, current: Height },

    #[error("genesis block already present")]
    GenesisAlreadyPresent,

    #[error("chain has no genesis block")]
    MissingGenesis,

    #[error("transaction {id} rejected: {source}")]
    Transaction {
        id: EntityId,
        #[source]
        source: TxError,
    },

    #[error("block application failed and was rolled back: {0}")]
    ApplyFailed(String),
}

/// Result type for block operations.
pub type BlockResult<T> = Result<T, BlockError>;
