//! # Unconfirmed Reservation Guard
//!
//! Advisory, in-memory tables stopping the unconfirmed pool from
//! admitting more claims against a task than its funds or bounty slots
//! can honor. The source of truth for accepted submissions is the
//! ledger; these tables must be cleared whenever the pool is flushed or
//! a reorg invalidates in-flight transactions.
//!
//! Reserve and release are idempotent per transaction id: a reservation
//! must end up released exactly once, on confirmation or on eviction,
//! and a double release must be a no-op rather than an underflow.

use std::collections::{HashMap, HashSet};
use tracing::trace;
use xel_types::EntityId;

/// Reservation tables for unconfirmed work-market transactions.
#[derive(Debug, Clone, Default)]
pub struct UnconfirmedGuard {
    /// work id -> (transaction id -> reserved pow amount)
    pow: HashMap<EntityId, HashMap<EntityId, u64>>,
    /// work id -> transaction ids holding a bounty slot
    bounty: HashMap<EntityId, HashSet<EntityId>>,
}

impl UnconfirmedGuard {
    /// Create empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `amount` of a task's pow fund for an unconfirmed
    /// transaction. Returns false if the reservation already existed.
    pub fn reserve_pow(&mut self, work_id: EntityId, tx_id: EntityId, amount: u64) -> bool {
        let inserted = self
            .pow
            .entry(work_id)
            .or_default()
            .insert(tx_id, amount)
            .is_none();
        if inserted {
            trace!(work_id, tx_id, amount, "pow reservation added");
        }
        inserted
    }

    /// Release a pow reservation. Returns the amount, or None if the
    /// reservation was already released.
    pub fn release_pow(&mut self, work_id: EntityId, tx_id: EntityId) -> Option<u64> {
        let slots = self.pow.get_mut(&work_id)?;
        let amount = slots.remove(&tx_id);
        if slots.is_empty() {
            self.pow.remove(&work_id);
        }
        if let Some(amount) = amount {
            trace!(work_id, tx_id, amount, "pow reservation released");
        }
        amount
    }

    /// Total pow fund reserved against a task.
    pub fn reserved_pow_total(&self, work_id: EntityId) -> u64 {
        self.pow
            .get(&work_id)
            .map_or(0, |slots| slots.values().sum())
    }

    /// Reserve one bounty slot. Returns false if already reserved.
    pub fn reserve_bounty(&mut self, work_id: EntityId, tx_id: EntityId) -> bool {
        let inserted = self.bounty.entry(work_id).or_default().insert(tx_id);
        if inserted {
            trace!(work_id, tx_id, "bounty slot reserved");
        }
        inserted
    }

    /// Release a bounty slot. Returns false if already released.
    pub fn release_bounty(&mut self, work_id: EntityId, tx_id: EntityId) -> bool {
        let Some(slots) = self.bounty.get_mut(&work_id) else {
            return false;
        };
        let removed = slots.remove(&tx_id);
        if slots.is_empty() {
            self.bounty.remove(&work_id);
        }
        removed
    }

    /// Bounty slots currently reserved against a task.
    pub fn reserved_bounty_count(&self, work_id: EntityId) -> usize {
        self.bounty.get(&work_id).map_or(0, HashSet::len)
    }

    /// Whether any reservation exists.
    pub fn is_empty(&self) -> bool {
        self.pow.is_empty() && self.bounty.is_empty()
    }

    /// Drop every reservation (pool flush or reorg).
    pub fn clear(&mut self) {
        self.pow.clear();
        self.bounty.clear();
    }
}
