//! # Difficulty Engine
//!
//! Two independent retargets, both pure over committed chain history:
//!
//! - the proof-of-stake **base target**, recomputed at even heights from
//!   the average block time of the last three predecessors, and
//! - the embedded proof-of-work **target**, a Dark-Gravity-Wave-style
//!   retarget over the accepted proof-of-work count of the last 12
//!   blocks.
//!
//! The factor arithmetic is integer rationals throughout; no floating
//! point touches a consensus value. The pow target carries a per-tip
//! cache which is invalidated when a reorg moves the tip.

use crate::domain::chain::BlockSource;
use primitive_types::U256;
use tracing::debug;
use xel_types::constants::{
    easiest_pow_target, BASE_TARGET_GAMMA, MAX_BASE_TARGET_2, MAX_BLOCKTIME_LIMIT,
    MIN_BASE_TARGET, MIN_BLOCKTIME_LIMIT, POW_RETARGET_DEPTH, TARGET_POW_PER_BLOCK,
};
use xel_types::{Attachment, Block, EntityId, Height};

/// Number of accepted proof-of-work submissions in a block.
pub fn pow_tx_count(block: &Block) -> u64 {
    block
        .transactions
        .iter()
        .filter(|tx| matches!(tx.attachment, Attachment::ProofOfWork { .. }))
        .count() as u64
}

/// Base target for a candidate forged on `prev` at `candidate_timestamp`.
///
/// Recomputed at even previous heights above 2 from the average block
/// time over the last three predecessors; odd and early heights copy the
/// previous base target unchanged.
pub fn next_base_target(
    chain: &impl BlockSource,
    prev: &Block,
    candidate_timestamp: u32,
) -> u64 {
    if prev.height <= 2 || prev.height % 2 != 0 {
        return prev.base_target;
    }
    let Some(that) = chain.block_at_height(prev.height - 2) else {
        return prev.base_target;
    };
    let blocktime_average = u64::from(candidate_timestamp.saturating_sub(that.timestamp)) / 3;

    let new_target = if blocktime_average > 60 {
        prev.base_target * blocktime_average.min(MAX_BLOCKTIME_LIMIT) / 60
    } else {
        let shortfall = 60 - blocktime_average.max(MIN_BLOCKTIME_LIMIT);
        prev.base_target - prev.base_target * BASE_TARGET_GAMMA * shortfall / 6000
    };

    new_target.clamp(MIN_BASE_TARGET, MAX_BASE_TARGET_2)
}

/// Chain-selection weight gained by a block: `floor(2^64 / base_target)`.
pub fn difficulty_increment(base_target: u64) -> U256 {
    (U256::one() << 64) / U256::from(base_target)
}

/// Cumulative difficulty of a block given its predecessor's.
pub fn next_cumulative_difficulty(previous: U256, base_target: u64) -> U256 {
    previous + difficulty_increment(base_target)
}

/// Embedded proof-of-work retarget with a per-tip cache.
#[derive(Debug, Clone)]
pub struct DifficultyEngine {
    retarget_depth: u32,
    target_per_block: u64,
    cache: Option<(EntityId, U256)>,
    dirty: bool,
}

impl Default for DifficultyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DifficultyEngine {
    /// Engine with the chain's retarget parameters.
    pub fn new() -> Self {
        Self::with_params(POW_RETARGET_DEPTH, TARGET_POW_PER_BLOCK)
    }

    /// Engine with explicit parameters (tests shrink the window).
    pub fn with_params(retarget_depth: u32, target_per_block: u64) -> Self {
        Self {
            retarget_depth,
            target_per_block,
            cache: None,
            dirty: true,
        }
    }

    /// Invalidate the cache after a reorg moved the tip.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Target applicable to submissions entering the next block, cached
    /// per tip id.
    pub fn pow_target(&mut self, chain: &impl BlockSource) -> U256 {
        let tip_id = chain.tip().map_or(0, Block::id);
        if !self.dirty {
            if let Some((cached_id, cached)) = self.cache {
                if cached_id == tip_id {
                    return cached;
                }
            }
        }
        let target = self.pow_target_at(chain, chain.chain_height());
        debug!(tip_id, %target, "pow target recomputed");
        self.cache = Some((tip_id, target));
        self.dirty = false;
        target
    }

    /// Target as of `as_of_height`, replayed deterministically from
    /// genesis. Used for final validation of transactions "as of the
    /// block" they enter.
    pub fn pow_target_at(&self, chain: &impl BlockSource, as_of_height: Height) -> U256 {
        let easiest = easiest_pow_target();
        if chain.block_at_height(0).is_none() {
            return easiest;
        }
        let mut target = easiest;
        for height in 1..=as_of_height {
            target = self.retarget_step(chain, height, target);
        }
        target
    }

    /// One retarget step: the target after the block at `tip_height`.
    fn retarget_step(&self, chain: &impl BlockSource, tip_height: Height, previous: U256) -> U256 {
        let easiest = easiest_pow_target();
        let seen = self.retarget_depth.min(tip_height);
        if seen == 0 {
            return easiest;
        }

        let mut counter: u64 = 0;
        for height in (tip_height - seen + 1)..=tip_height {
            if let Some(block) = chain.block_at_height(height) {
                counter += pow_tx_count(block);
            }
        }
        // a short chain sees a short window; upscale linearly to what a
        // full window would have counted
        if seen < self.retarget_depth {
            counter = counter * u64::from(self.retarget_depth) / u64::from(seen);
        }
        if counter == 0 {
            return easiest;
        }

        let window_target = self.target_per_block * u64::from(self.retarget_depth);
        let new_target = if counter > 2 * window_target {
            previous / 2
        } else if counter * 2 < window_target {
            previous * 2
        } else {
            previous * U256::from(window_target) / U256::from(counter)
        };
        new_target.min(easiest)
    }
}
