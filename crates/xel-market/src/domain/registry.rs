//! # Work Registry
//!
//! Height-versioned store of task records. Every mutation writes a new
//! row version at the mutating block's height, so `rollback_to` restores
//! the registry exactly as it stood at any earlier height.

use crate::domain::guard::UnconfirmedGuard;
use crate::domain::work::{CloseReason, Work};
use tracing::{debug, info};
use xel_storage::VersionedTable;
use xel_types::errors::{TxError, TxResult};
use xel_types::{AccountId, EntityId, Height};

/// Height-versioned task store and fund accounting.
#[derive(Debug, Clone, Default)]
pub struct WorkRegistry {
    works: VersionedTable<Work>,
}

impl WorkRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            works: VersionedTable::new(),
        }
    }

    /// Register a freshly created task.
    pub fn create_task(&mut self, work: Work, height: Height) -> TxResult<()> {
        info!(
            work_id = work.id,
            amount = work.original_amount,
            pow_fund = work.balance_pow_fund,
            bounty_fund = work.balance_bounty_fund,
            timeout_height = work.timeout_height,
            "task created"
        );
        self.works.insert(work, height)?;
        Ok(())
    }

    /// Current version of a task.
    pub fn get(&self, work_id: EntityId) -> Option<&Work> {
        self.works.latest(work_id)
    }

    /// Current version, or the canonical unknown-work rejection.
    pub fn get_open(&self, work_id: EntityId) -> TxResult<&Work> {
        let work = self
            .works
            .latest(work_id)
            .ok_or(TxError::UnknownWork { work_id })?;
        if work.closed {
            return Err(TxError::WorkClosed { work_id });
        }
        Ok(work)
    }

    /// Whether a task is still open, optionally requiring `account_id`
    /// to be its creator.
    pub fn is_pending(&self, work_id: EntityId, account_id: Option<AccountId>) -> bool {
        match self.works.latest(work_id) {
            Some(work) => {
                work.is_open() && account_id.map_or(true, |id| id == work.creator_id)
            }
            None => false,
        }
    }

    /// Pow fund still available for new submissions.
    ///
    /// With a guard supplied, unconfirmed reservations are subtracted,
    /// giving the admission view the unconfirmed pool must use.
    pub fn remaining_pow_fund(&self, work_id: EntityId, guard: Option<&UnconfirmedGuard>) -> u64 {
        let confirmed = self
            .works
            .latest(work_id)
            .filter(|work| work.is_open())
            .map_or(0, |work| work.balance_pow_fund);
        let reserved = guard.map_or(0, |guard| guard.reserved_pow_total(work_id));
        confirmed.saturating_sub(reserved)
    }

    /// Bounty slots already taken, confirmed plus reserved.
    pub fn bounty_slots_taken(&self, work_id: EntityId, guard: Option<&UnconfirmedGuard>) -> u32 {
        let confirmed = self
            .works
            .latest(work_id)
            .map_or(0, |work| work.received_bounties);
        let reserved = guard.map_or(0, |guard| guard.reserved_bounty_count(work_id) as u32);
        confirmed + reserved
    }

    /// Pay one proof-of-work unit; returns `(creator, payout, refund)`,
    /// where the refund is what an exhaustion close returns to the
    /// creator (zero while the task stays open).
    pub fn reduce_one_pow_submission(
        &mut self,
        work_id: EntityId,
        height: Height,
    ) -> TxResult<(AccountId, u64, u64)> {
        let mut work = self.get_open(work_id)?.clone();
        let creator = work.creator_id;
        let (payout, refund) = work.reduce_one_pow_submission()?;
        debug!(
            work_id,
            payout,
            refund,
            remaining = work.balance_pow_fund,
            closed = work.closed,
            "pow unit paid"
        );
        self.works.insert(work, height)?;
        Ok((creator, payout, refund))
    }

    /// Pay the bounty fund to its first accepted bounty and close the
    /// task; returns `(creator, payout, pow_refund)`.
    pub fn kill_bounty_fund(
        &mut self,
        work_id: EntityId,
        height: Height,
    ) -> TxResult<(AccountId, u64, u64)> {
        let mut work = self.get_open(work_id)?.clone();
        let creator = work.creator_id;
        let (payout, pow_refund) = work.kill_bounty_fund()?;
        info!(work_id, payout, pow_refund, "bounty claimed, task closed");
        self.works.insert(work, height)?;
        Ok((creator, payout, pow_refund))
    }

    /// Count one bounty announcement against the task's limit.
    pub fn register_announcement(&mut self, work_id: EntityId, height: Height) -> TxResult<()> {
        let mut work = self.get_open(work_id)?.clone();
        work.register_announcement()?;
        self.works.insert(work, height)?;
        Ok(())
    }

    /// Close a task and return (creator id, refund of both funds).
    pub fn cancel(
        &mut self,
        work_id: EntityId,
        reason: CloseReason,
        height: Height,
    ) -> TxResult<(AccountId, u64)> {
        let mut work = self.get_open(work_id)?.clone();
        let creator = work.creator_id;
        let refund = work.close(reason)?;
        info!(work_id, ?reason, refund, "task closed");
        self.works.insert(work, height)?;
        Ok((creator, refund))
    }

    /// Open tasks whose timeout height is exactly `height`.
    pub fn timeout_at(&self, height: Height) -> Vec<EntityId> {
        let mut due: Vec<EntityId> = self
            .works
            .all_latest()
            .filter(|work| work.is_open() && work.timeout_height == height)
            .map(|work| work.id)
            .collect();
        due.sort_unstable();
        due
    }

    /// Open tasks, in id order.
    pub fn open_tasks(&self) -> Vec<&Work> {
        let mut open: Vec<&Work> = self.works.all_latest().filter(|w| w.is_open()).collect();
        open.sort_unstable_by_key(|w| w.id);
        open
    }

    /// Delete all versions above `height` and restore earlier ones.
    pub fn rollback_to(&mut self, height: Height) -> usize {
        self.works.rollback_to(height)
    }
}
