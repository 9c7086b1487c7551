//! Consensus configuration.

use xel_types::constants;

/// Tunable limits for block validation.
///
/// Defaults are the chain constants; tests shrink them to exercise the
/// limit paths without building huge fixtures.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Maximum transactions per block.
    pub max_txs_per_block: usize,
    /// Maximum total transaction payload per block, in bytes.
    pub max_payload_length: usize,
    /// Maximum forward clock drift on blocks, in seconds.
    pub max_timedrift: u32,
    /// Only this block version is accepted.
    pub block_version: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_txs_per_block: constants::MAX_NUMBER_OF_TRANSACTIONS,
            max_payload_length: constants::MAX_PAYLOAD_LENGTH,
            max_timedrift: constants::MAX_TIMEDRIFT,
            block_version: 1,
        }
    }
}
