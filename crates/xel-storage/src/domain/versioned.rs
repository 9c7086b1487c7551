//! # Versioned Tables
//!
//! An append-only log per entity, keyed by `(id, height)`, with a
//! `latest` projection giving the current view. Inserting a row at the
//! height it was mutated preserves every historical version; rolling
//! back to a height deletes all rows above it and recomputes `latest`,
//! which is exactly the inverse of the block applications being undone.

use crate::domain::errors::{StorageError, StorageResult};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use xel_types::{EntityId, Height};

/// A row that can live in a [`VersionedTable`].
pub trait VersionedRow: Clone {
    /// Stable identity shared by all versions of this row.
    fn row_id(&self) -> EntityId;
}

/// Append-only multi-version table with a latest-version projection.
#[derive(Debug, Clone)]
pub struct VersionedTable<V: VersionedRow> {
    rows: BTreeMap<(EntityId, Height), V>,
    latest: HashMap<EntityId, Height>,
}

// Derived `Default` would demand `V: Default`; rows never need one.
impl<V: VersionedRow> Default for VersionedTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VersionedRow> VersionedTable<V> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            latest: HashMap::new(),
        }
    }

    /// Append a new version of a row at `height` and move its latest marker.
    ///
    /// Heights per id must be non-decreasing; a same-height insert
    /// overwrites the version written earlier in the same block.
    pub fn insert(&mut self, row: V, height: Height) -> StorageResult<()> {
        let id = row.row_id();
        if let Some(&latest) = self.latest.get(&id) {
            if height < latest {
                return Err(StorageError::HeightRegression {
                    id,
                    latest,
                    attempted: height,
                });
            }
        }
        self.rows.insert((id, height), row);
        self.latest.insert(id, height);
        Ok(())
    }

    /// Current version of a row.
    pub fn latest(&self, id: EntityId) -> Option<&V> {
        let height = *self.latest.get(&id)?;
        self.rows.get(&(id, height))
    }

    /// Height the current version of a row was written at.
    pub fn latest_height(&self, id: EntityId) -> Option<Height> {
        self.latest.get(&id).copied()
    }

    /// Version of a row in effect at `height` (the greatest version
    /// written at or below it).
    pub fn at_height(&self, id: EntityId, height: Height) -> Option<&V> {
        self.rows
            .range((id, 0)..=(id, height))
            .next_back()
            .map(|(_, row)| row)
    }

    /// Current versions of every row, in id order.
    pub fn all_latest(&self) -> impl Iterator<Item = &V> {
        self.latest.iter().filter_map(|(&id, &height)| {
            // latest always points at an existing row
            self.rows.get(&(id, height))
        })
    }

    /// Number of distinct rows.
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    /// Delete every version above `height` and recompute latest markers.
    ///
    /// Rows whose every version lies above `height` disappear entirely.
    /// Returns the number of versions deleted.
    pub fn rollback_to(&mut self, height: Height) -> usize {
        let doomed: Vec<(EntityId, Height)> = self
            .rows
            .keys()
            .filter(|&&(_, h)| h > height)
            .copied()
            .collect();
        for key in &doomed {
            self.rows.remove(key);
        }
        for &(id, _) in &doomed {
            match self
                .rows
                .range((id, 0)..=(id, height))
                .next_back()
                .map(|(&(_, h), _)| h)
            {
                Some(restored) => {
                    self.latest.insert(id, restored);
                }
                None => {
                    self.latest.remove(&id);
                }
            }
        }
        if !doomed.is_empty() {
            debug!(
                deleted = doomed.len(),
                height, "rolled back versioned table"
            );
        }
        doomed.len()
    }

    /// Drop every row.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.latest.clear();
    }
}
