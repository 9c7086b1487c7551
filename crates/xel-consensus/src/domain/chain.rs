//! # Chain State
//!
//! The block sequence itself, indexed by height and by id. Heights are
//! dense: `blocks[h]` is the block at height `h`, genesis at 0.

use std::collections::HashMap;
use xel_types::{Block, EntityId, Height};

/// Read access to committed blocks, as the difficulty engine needs it.
pub trait BlockSource {
    /// Block at a height, if committed.
    fn block_at_height(&self, height: Height) -> Option<&Block>;

    /// The current tip.
    fn tip(&self) -> Option<&Block>;

    /// Height of the tip.
    fn chain_height(&self) -> Height;
}

/// In-memory block sequence with an id index.
#[derive(Debug, Clone, Default)]
pub struct ChainState {
    blocks: Vec<Block>,
    by_id: HashMap<EntityId, Height>,
}

impl ChainState {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any block is committed.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append a block. The caller has already validated linkage.
    pub fn push(&mut self, block: Block) {
        self.by_id.insert(block.id(), block.height);
        self.blocks.push(block);
    }

    /// Block by id.
    pub fn block_by_id(&self, id: EntityId) -> Option<&Block> {
        self.by_id
            .get(&id)
            .and_then(|&height| self.blocks.get(height as usize))
    }

    /// Drop every block above `height`; returns how many were dropped.
    pub fn truncate_to(&mut self, height: Height) -> usize {
        let keep = (height as usize) + 1;
        if keep >= self.blocks.len() {
            return 0;
        }
        let dropped = self.blocks.split_off(keep);
        for block in &dropped {
            self.by_id.remove(&block.id());
        }
        dropped.len()
    }

    /// Iterate committed blocks, genesis first.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

impl BlockSource for ChainState {
    fn block_at_height(&self, height: Height) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    fn chain_height(&self) -> Height {
        self.blocks.len().saturating_sub(1) as Height
    }
}
