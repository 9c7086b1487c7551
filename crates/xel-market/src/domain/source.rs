//! # Prunable Task Source Code
//!
//! The chain commits to `sha256(source)` inside the creating
//! transaction's signed bytes; the source itself is prunable payload.
//! Once pruned, the bytes are gone but the hash commitment stays, so the
//! row remains verifiable against the transaction.

use std::collections::HashMap;
use tracing::debug;
use xel_types::attachment::PrunableSourceCode;
use xel_types::{EntityId, Hash, Height};

/// A stored task source, possibly pruned down to its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSource {
    /// Task the source belongs to.
    pub work_id: EntityId,
    /// The source bytes; None once pruned.
    pub source: Option<Vec<u8>>,
    /// Language tag.
    pub language: u8,
    /// Commitment hash over the original source bytes.
    pub source_hash: Hash,
    /// Height of the creating block.
    pub height: Height,
}

/// Per-task source-code store with pruning.
#[derive(Debug, Clone, Default)]
pub struct SourceStore {
    rows: HashMap<EntityId, StoredSource>,
}

impl SourceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the source attached to a new task.
    pub fn insert(&mut self, work_id: EntityId, code: &PrunableSourceCode, height: Height) {
        self.rows.insert(
            work_id,
            StoredSource {
                work_id,
                source: Some(code.source.clone()),
                language: code.language,
                source_hash: code.source_hash(),
                height,
            },
        );
    }

    /// Stored source for a task.
    pub fn get(&self, work_id: EntityId) -> Option<&StoredSource> {
        self.rows.get(&work_id)
    }

    /// Drop the source bytes, keeping the hash commitment.
    ///
    /// Returns false if the task is unknown or already pruned.
    pub fn prune(&mut self, work_id: EntityId) -> bool {
        match self.rows.get_mut(&work_id) {
            Some(row) if row.source.is_some() => {
                row.source = None;
                debug!(work_id, "task source pruned");
                true
            }
            _ => false,
        }
    }

    /// Whether the task is known but its source bytes are gone.
    pub fn is_pruned(&self, work_id: EntityId) -> bool {
        self.rows
            .get(&work_id)
            .is_some_and(|row| row.source.is_none())
    }

    /// Drop rows created above `height`.
    pub fn rollback_to(&mut self, height: Height) {
        self.rows.retain(|_, row| row.height <= height);
    }
}
