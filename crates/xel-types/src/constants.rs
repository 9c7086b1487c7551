//! # Chain Constants
//!
//! Consensus-critical constants. Every node must agree on these values
//! bit-for-bit; changing any of them is a hard fork.

use primitive_types::U256;

/// Base units per XEL coin (NQT-style fixed point).
pub const ONE_XEL: u64 = 100_000_000;

/// Total coin supply in whole XEL.
pub const MAX_BALANCE_XEL: u64 = 100_000_000;

/// Total coin supply in base units.
pub const MAX_BALANCE_NQT: u64 = MAX_BALANCE_XEL * ONE_XEL;

/// Base target of the genesis block.
pub const INITIAL_BASE_TARGET: u64 = 153_722_867;

/// Upper clamp for the retargeted base target.
pub const MAX_BASE_TARGET_2: u64 = INITIAL_BASE_TARGET * 50;

/// Lower clamp for the retargeted base target.
pub const MIN_BASE_TARGET: u64 = INITIAL_BASE_TARGET * 9 / 10;

/// Average block times below this floor are treated as this value (seconds).
pub const MIN_BLOCKTIME_LIMIT: u64 = 53;

/// Average block times above this ceiling are treated as this value (seconds).
pub const MAX_BLOCKTIME_LIMIT: u64 = 67;

/// Weight of the downward base-target adjustment.
pub const BASE_TARGET_GAMMA: u64 = 64;

/// Blocks walked back by the embedded proof-of-work retarget.
pub const POW_RETARGET_DEPTH: u32 = 12;

/// Desired accepted proof-of-work submissions per block.
pub const TARGET_POW_PER_BLOCK: u64 = 10;

/// Longest allowed task title, in bytes.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Shortest allowed task deadline, in blocks.
pub const MIN_WORK_DEADLINE: u16 = 3;

/// Longest allowed task deadline, in blocks.
pub const MAX_WORK_DEADLINE: u16 = 1440;

/// Fewest bounty slots a task may declare.
pub const MIN_BOUNTY_LIMIT: u32 = 1;

/// Most bounty slots a task may declare.
pub const MAX_BOUNTY_LIMIT: u32 = 10;

/// Smallest per-unit proof-of-work reward, in base units.
pub const MIN_XEL_PER_POW: u64 = 1000;

/// Largest per-unit proof-of-work reward, in base units.
pub const MAX_WORK_POW_REWARD: u64 = 10_000_000_000;

/// A new task must fund at least this many unit rewards.
pub const PAY_FOR_AT_LEAST_X_POW: u64 = 20;

/// Shortest allowed submission input vector.
pub const MIN_INTS_FOR_WORK: usize = 3;

/// Longest allowed submission input vector.
pub const MAX_INTS_FOR_WORK: usize = 12;

/// Deposit charged when a transaction references another by full hash.
pub const UNCONFIRMED_POOL_DEPOSIT: u64 = 100 * ONE_XEL;

/// Refundable deposit charged per bounty announcement.
pub const DEPOSIT_BOUNTY_ANNOUNCEMENT: u64 = 10 * ONE_XEL;

/// Transaction deadline (minutes) required on submission transactions.
pub const SUBMISSION_TX_DEADLINE: u16 = 3;

/// Minimum fee for fee-bearing transaction kinds, in base units.
pub const MINIMUM_TX_FEE: u64 = ONE_XEL;

/// Maximum forward clock drift tolerated on blocks and transactions (seconds).
pub const MAX_TIMEDRIFT: u32 = 15;

/// Maximum transactions per block.
pub const MAX_NUMBER_OF_TRANSACTIONS: usize = 255;

/// Maximum total transaction payload per block, in bytes.
pub const MAX_PAYLOAD_LENGTH: usize = MAX_NUMBER_OF_TRANSACTIONS * 176;

/// Easiest possible embedded proof-of-work target (16 leading zero bits).
pub fn easiest_pow_target() -> U256 {
    U256::MAX >> 16
}
