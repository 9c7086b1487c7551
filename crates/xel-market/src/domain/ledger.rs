//! # Submission Ledger
//!
//! Persisted proof-of-work and bounty submissions plus bounty
//! announcements, all height-versioned. The `by_hash` index enforces the
//! anti-replay rule: a (work, input vector, kind) content hash may be
//! accepted at most once across the whole chain. The index is a
//! projection of the submission table and is rebuilt after rollback.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use xel_storage::{VersionedRow, VersionedTable};
use xel_types::errors::{TxError, TxResult};
use xel_types::{AccountId, EntityId, Hash, Height};

/// An accepted proof-of-work or bounty submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Id of the submitting transaction.
    pub id: EntityId,
    /// Task the submission is against.
    pub work_id: EntityId,
    /// Block the submission was confirmed in.
    pub block_id: EntityId,
    /// Submitting account.
    pub account_id: AccountId,
    /// True for proof-of-work, false for bounty.
    pub is_pow: bool,
    /// Input vector consumed by the task's code.
    pub input: Vec<i32>,
    /// Anti-replay content hash over (work, input, kind).
    pub hash: Hash,
    /// Amount paid out for this submission, in base units.
    pub payout_amount: u64,
    /// Whether the payout has been credited. Proof-of-work rows are paid
    /// at acceptance; bounty rows wait for a payout settlement.
    pub paid: bool,
    /// Set when the submission confirmed against an already-closed task.
    pub too_late: bool,
}

impl VersionedRow for Submission {
    fn row_id(&self) -> EntityId {
        self.id
    }
}

/// A bounty hash pre-commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAnnouncement {
    /// Id of the announcing transaction.
    pub id: EntityId,
    /// Task the announcement targets.
    pub work_id: EntityId,
    /// Announcing account.
    pub account_id: AccountId,
    /// The committed content hash.
    pub hash_announced: Vec<u8>,
    /// Set when the announcement confirmed against a closed task.
    pub too_late: bool,
}

impl VersionedRow for SubmissionAnnouncement {
    fn row_id(&self) -> EntityId {
        self.id
    }
}

/// Height-versioned store of submissions and announcements.
#[derive(Debug, Clone, Default)]
pub struct SubmissionLedger {
    submissions: VersionedTable<Submission>,
    announcements: VersionedTable<SubmissionAnnouncement>,
    by_hash: HashMap<Hash, EntityId>,
}

impl SubmissionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            submissions: VersionedTable::new(),
            announcements: VersionedTable::new(),
            by_hash: HashMap::new(),
        }
    }

    /// Whether a content hash has already been accepted.
    pub fn has_hash(&self, hash: &Hash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Record an accepted submission.
    pub fn insert_submission(&mut self, submission: Submission, height: Height) -> TxResult<()> {
        if self.by_hash.contains_key(&submission.hash) {
            return Err(TxError::DuplicateSubmission {
                work_id: submission.work_id,
            });
        }
        debug!(
            id = submission.id,
            work_id = submission.work_id,
            is_pow = submission.is_pow,
            payout = submission.payout_amount,
            "submission recorded"
        );
        self.by_hash.insert(submission.hash, submission.id);
        self.submissions.insert(submission, height)?;
        Ok(())
    }

    /// Record a bounty announcement.
    pub fn insert_announcement(
        &mut self,
        announcement: SubmissionAnnouncement,
        height: Height,
    ) -> TxResult<()> {
        self.announcements.insert(announcement, height)?;
        Ok(())
    }

    /// Current version of a submission.
    pub fn submission(&self, id: EntityId) -> Option<&Submission> {
        self.submissions.latest(id)
    }

    /// Current version of an announcement.
    pub fn announcement(&self, id: EntityId) -> Option<&SubmissionAnnouncement> {
        self.announcements.latest(id)
    }

    /// Whether a hash has already been announced against a task.
    pub fn has_announced_hash(&self, work_id: EntityId, hash: &[u8]) -> bool {
        self.announcements
            .all_latest()
            .any(|a| a.work_id == work_id && a.hash_announced == hash)
    }

    /// Flag a submission that confirmed against a closed task.
    pub fn mark_too_late(&mut self, id: EntityId, height: Height) -> TxResult<()> {
        let mut submission = self
            .submissions
            .latest(id)
            .ok_or(TxError::Store(format!("submission {id} missing")))?
            .clone();
        submission.too_late = true;
        self.submissions.insert(submission, height)?;
        Ok(())
    }

    /// Flag a submission as paid out.
    pub fn mark_paid(&mut self, id: EntityId, height: Height) -> TxResult<()> {
        let mut submission = self
            .submissions
            .latest(id)
            .ok_or(TxError::Store(format!("submission {id} missing")))?
            .clone();
        submission.paid = true;
        self.submissions.insert(submission, height)?;
        Ok(())
    }

    /// Accepted submissions for a task, of one kind.
    pub fn submissions_for(&self, work_id: EntityId, is_pow: bool) -> Vec<&Submission> {
        let mut rows: Vec<&Submission> = self
            .submissions
            .all_latest()
            .filter(|s| s.work_id == work_id && s.is_pow == is_pow)
            .collect();
        rows.sort_unstable_by_key(|s| s.id);
        rows
    }

    /// Count of accepted submissions for a task, of one kind.
    pub fn count_for_work(&self, work_id: EntityId, is_pow: bool) -> usize {
        self.submissions
            .all_latest()
            .filter(|s| s.work_id == work_id && s.is_pow == is_pow)
            .count()
    }

    /// Accepted submissions an account made against a task.
    pub fn for_account(&self, work_id: EntityId, account_id: AccountId) -> Vec<&Submission> {
        let mut rows: Vec<&Submission> = self
            .submissions
            .all_latest()
            .filter(|s| s.work_id == work_id && s.account_id == account_id)
            .collect();
        rows.sort_unstable_by_key(|s| s.id);
        rows
    }

    /// Announcements registered against a task.
    pub fn announcements_for(&self, work_id: EntityId) -> Vec<&SubmissionAnnouncement> {
        let mut rows: Vec<&SubmissionAnnouncement> = self
            .announcements
            .all_latest()
            .filter(|a| a.work_id == work_id)
            .collect();
        rows.sort_unstable_by_key(|a| a.id);
        rows
    }

    /// Delete all versions above `height` and rebuild the hash index.
    pub fn rollback_to(&mut self, height: Height) -> usize {
        let deleted =
            self.submissions.rollback_to(height) + self.announcements.rollback_to(height);
        if deleted > 0 {
            self.by_hash = self
                .submissions
                .all_latest()
                .map(|s| (s.hash, s.id))
                .collect();
        }
        deleted
    }
}
