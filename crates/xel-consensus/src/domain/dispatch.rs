//! # Transaction Type Dispatch
//!
//! A closed enum over (type, subtype) with the per-kind behavior table:
//! validate, apply-unconfirmed, apply, undo-unconfirmed. The generic
//! rules run for every transaction; the work-market kinds add hooks that
//! touch the registry, ledger, and reservation guard.
//!
//! Validation never mutates state. The unconfirmed debit is always
//! paired with a reversal when a hook rejects, and every guard
//! reservation is released exactly once, on confirmation or on undo.

use crate::domain::accounts::AccountLedger;
use primitive_types::U256;
use std::collections::HashSet;
use tracing::warn;
use xel_market::domain::work::{CloseReason, Work};
use xel_market::{SourceStore, Submission, SubmissionAnnouncement, SubmissionLedger, TaskVm, UnconfirmedGuard, WorkRegistry};
use xel_types::attachment::content_hash;
use xel_types::constants::{
    DEPOSIT_BOUNTY_ANNOUNCEMENT, MINIMUM_TX_FEE, PAY_FOR_AT_LEAST_X_POW, SUBMISSION_TX_DEADLINE,
    UNCONFIRMED_POOL_DEPOSIT,
};
use xel_types::errors::{TxError, TxResult};
use xel_types::{Attachment, EntityId, Hash, Height, Transaction};

/// The closed set of transaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    /// Plain currency transfer.
    OrdinaryPayment,
    /// Post a new funded task.
    NewTask,
    /// Block-assembly cancellation settlement.
    CancelTask,
    /// Proof-of-work submission.
    ProofOfWork,
    /// Bounty submission.
    Bounty,
    /// Settlement paying a recorded bounty winner.
    BountyPayout,
    /// Creator-initiated cancellation request.
    CancelTaskRequest,
    /// Bounty hash pre-commitment.
    BountyAnnouncement,
}

impl TxKind {
    /// Kind of an attachment.
    pub fn of(attachment: &Attachment) -> Self {
        match attachment {
            Attachment::OrdinaryPayment => TxKind::OrdinaryPayment,
            Attachment::NewTask { .. } => TxKind::NewTask,
            Attachment::CancelTask { .. } => TxKind::CancelTask,
            Attachment::ProofOfWork { .. } => TxKind::ProofOfWork,
            Attachment::Bounty { .. } => TxKind::Bounty,
            Attachment::BountyPayout { .. } => TxKind::BountyPayout,
            Attachment::CancelTaskRequest { .. } => TxKind::CancelTaskRequest,
            Attachment::BountyAnnouncement { .. } => TxKind::BountyAnnouncement,
        }
    }

    /// Whether this kind carries a recipient.
    pub fn requires_recipient(&self) -> bool {
        matches!(self, TxKind::OrdinaryPayment | TxKind::BountyPayout)
    }

    /// Kinds that must not declare a fee.
    pub fn is_zero_fee(&self) -> bool {
        matches!(
            self,
            TxKind::CancelTask
                | TxKind::CancelTaskRequest
                | TxKind::BountyPayout
                | TxKind::ProofOfWork
                | TxKind::Bounty
        )
    }

    /// Kinds whose amount is paid out of a task fund rather than the
    /// sender's balance.
    pub fn funds_from_nowhere(&self) -> bool {
        matches!(self, TxKind::ProofOfWork | TxKind::BountyPayout)
    }

    /// Kinds that must declare a zero amount.
    pub fn requires_zero_amount(&self) -> bool {
        matches!(
            self,
            TxKind::CancelTask
                | TxKind::CancelTaskRequest
                | TxKind::Bounty
                | TxKind::BountyAnnouncement
        )
    }

    /// Kinds whose transaction deadline must be exactly the submission
    /// deadline.
    pub fn requires_submission_deadline(&self) -> bool {
        matches!(self, TxKind::ProofOfWork | TxKind::Bounty)
    }
}

/// Block-scoped duplicate policy: one cancellation per work, one
/// submission per content hash, one payout per recorded submission,
/// one announcement per (work, hash).
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    cancels: HashSet<EntityId>,
    hashes: HashSet<Hash>,
    payouts: HashSet<EntityId>,
    announced: HashSet<(EntityId, Vec<u8>)>,
}

impl DuplicateTracker {
    /// Fresh tracker for one block.
    pub fn new() -> Self {
        Self::default()
    }

    fn note_cancel(&mut self, work_id: EntityId) -> TxResult<()> {
        if !self.cancels.insert(work_id) {
            return Err(TxError::DuplicateInBlock { work_id });
        }
        Ok(())
    }

    fn note_hash(&mut self, work_id: EntityId, hash: Hash) -> TxResult<()> {
        if !self.hashes.insert(hash) {
            return Err(TxError::DuplicateInBlock { work_id });
        }
        Ok(())
    }

    fn note_payout(&mut self, work_id: EntityId, submission_id: EntityId) -> TxResult<()> {
        if !self.payouts.insert(submission_id) {
            return Err(TxError::DuplicateInBlock { work_id });
        }
        Ok(())
    }

    fn note_announcement(&mut self, work_id: EntityId, hash: &[u8]) -> TxResult<()> {
        if !self.announced.insert((work_id, hash.to_vec())) {
            return Err(TxError::DuplicateInBlock { work_id });
        }
        Ok(())
    }
}

/// All consensus state a transaction can touch.
#[derive(Debug, Default)]
pub struct MarketStores {
    /// Account balances.
    pub accounts: AccountLedger,
    /// Task records.
    pub registry: WorkRegistry,
    /// Accepted submissions and announcements.
    pub ledger: SubmissionLedger,
    /// Prunable task sources.
    pub sources: SourceStore,
    /// Unconfirmed-pool reservations.
    pub guard: UnconfirmedGuard,
}

impl MarketStores {
    /// Roll every store back to `height` and drop pool-side state.
    pub fn rollback_to(&mut self, height: Height) -> TxResult<()> {
        self.registry.rollback_to(height);
        self.ledger.rollback_to(height);
        self.sources.rollback_to(height);
        self.accounts.rollback_to(height);
        self.accounts.reset_unconfirmed()?;
        self.guard.clear();
        Ok(())
    }
}

/// Behavior table over [`TxKind`], owning the task VM.
pub struct TransactionTypeDispatch<V: TaskVm> {
    vm: V,
}

impl<V: TaskVm> TransactionTypeDispatch<V> {
    /// Create a dispatcher around a task VM.
    pub fn new(vm: V) -> Self {
        Self { vm }
    }

    /// Validate a transaction without mutating anything.
    ///
    /// `pow_target` must be the embedded proof-of-work target as of the
    /// block the transaction enters (final validation) or the current
    /// tip (early validation). With a tracker supplied, the block-scoped
    /// duplicate rules run too.
    pub fn validate(
        &self,
        tx: &Transaction,
        stores: &MarketStores,
        pow_target: U256,
        mut duplicates: Option<&mut DuplicateTracker>,
    ) -> TxResult<()> {
        let kind = TxKind::of(&tx.attachment);
        tx.attachment.validate_structure()?;
        self.validate_envelope(tx, kind)?;

        match &tx.attachment {
            Attachment::OrdinaryPayment => Ok(()),
            Attachment::NewTask { xel_per_pow, .. } => {
                let required = PAY_FOR_AT_LEAST_X_POW * xel_per_pow;
                if tx.amount < required {
                    return Err(TxError::InsufficientFunding {
                        amount: tx.amount,
                        required,
                    });
                }
                let source = tx.source_code.as_ref().ok_or(TxError::MissingSourceCode)?;
                source.validate()
            }
            Attachment::CancelTask { work_id } | Attachment::CancelTaskRequest { work_id } => {
                let work = stores.registry.get_open(*work_id)?;
                if work.creator_id != tx.sender_id() {
                    return Err(TxError::NotWorkOwner {
                        work_id: *work_id,
                        account_id: tx.sender_id(),
                    });
                }
                if let Some(tracker) = duplicates.as_deref_mut() {
                    tracker.note_cancel(*work_id)?;
                }
                Ok(())
            }
            Attachment::ProofOfWork { work_id, input } => {
                let work = stores.registry.get_open(*work_id)?;
                if tx.amount != work.xel_per_pow {
                    return Err(TxError::AmountMismatch {
                        amount: tx.amount,
                        xel_per_pow: work.xel_per_pow,
                    });
                }
                let hash = content_hash(*work_id, input, true);
                if stores.ledger.has_hash(&hash) {
                    return Err(TxError::DuplicateSubmission { work_id: *work_id });
                }
                if let Some(tracker) = duplicates.as_deref_mut() {
                    tracker.note_hash(*work_id, hash)?;
                }
                // once the source is pruned the target check cannot be
                // replayed; the submission stands on the content hash
                if !stores.sources.is_pruned(*work_id)
                    && !self.vm.execute_proof_of_work(*work_id, input, pow_target)?
                {
                    return Err(TxError::PowRejectedByVm);
                }
                Ok(())
            }
            Attachment::Bounty { work_id, input } => {
                if tx.amount != 0 {
                    return Err(TxError::NonZeroBountyAmount { amount: tx.amount });
                }
                let work = stores.registry.get_open(*work_id)?;
                if work.received_bounties >= work.bounty_limit {
                    return Err(TxError::BountySlotsExhausted {
                        work_id: *work_id,
                        limit: work.bounty_limit,
                    });
                }
                let hash = content_hash(*work_id, input, false);
                if stores.ledger.has_hash(&hash) {
                    return Err(TxError::DuplicateSubmission { work_id: *work_id });
                }
                if let Some(tracker) = duplicates.as_deref_mut() {
                    tracker.note_hash(*work_id, hash)?;
                }
                if !self.vm.execute_bounty_hook(*work_id, input)? {
                    return Err(TxError::BountyRejectedByVm);
                }
                Ok(())
            }
            Attachment::BountyPayout {
                work_id,
                submission_id,
            } => {
                let submission = stores
                    .ledger
                    .submission(*submission_id)
                    .ok_or(TxError::UnknownSubmission {
                        submission_id: *submission_id,
                    })?;
                if submission.paid {
                    return Err(TxError::SubmissionAlreadyPaid {
                        submission_id: *submission_id,
                    });
                }
                if tx.amount != submission.payout_amount
                    || tx.recipient_id != Some(submission.account_id)
                {
                    return Err(TxError::PayoutMismatch {
                        submission_id: *submission_id,
                    });
                }
                if let Some(tracker) = duplicates.as_deref_mut() {
                    tracker.note_payout(*work_id, *submission_id)?;
                }
                Ok(())
            }
            Attachment::BountyAnnouncement {
                work_id,
                hash_announced,
            } => {
                let work = stores.registry.get_open(*work_id)?;
                if work.received_announcements >= work.bounty_limit {
                    return Err(TxError::AnnouncementSlotsExhausted {
                        work_id: *work_id,
                        limit: work.bounty_limit,
                    });
                }
                if stores.ledger.has_announced_hash(*work_id, hash_announced) {
                    return Err(TxError::DuplicateAnnouncement { work_id: *work_id });
                }
                if let Some(tracker) = duplicates.as_deref_mut() {
                    tracker.note_announcement(*work_id, hash_announced)?;
                }
                Ok(())
            }
        }
    }

    fn validate_envelope(&self, tx: &Transaction, kind: TxKind) -> TxResult<()> {
        if kind.requires_recipient() {
            if tx.recipient_id.is_none() {
                return Err(TxError::MissingRecipient);
            }
        } else if tx.recipient_id.is_some() {
            return Err(TxError::RecipientNotAllowed);
        }
        if kind.is_zero_fee() {
            if tx.fee != 0 {
                return Err(TxError::NonZeroFee { fee: tx.fee });
            }
        } else if tx.fee < MINIMUM_TX_FEE {
            return Err(TxError::FeeTooLow {
                fee: tx.fee,
                minimum: MINIMUM_TX_FEE,
            });
        }
        if kind.requires_zero_amount() && tx.amount != 0 && kind != TxKind::Bounty {
            // bounty has its own NotValid variant checked before fund
            // lookups
            return Err(TxError::AmountMustBeZero { amount: tx.amount });
        }
        if kind.requires_submission_deadline() && tx.deadline != SUBMISSION_TX_DEADLINE {
            return Err(TxError::WrongSubmissionDeadline {
                deadline: tx.deadline,
            });
        }
        Ok(())
    }

    /// The generic unconfirmed hold a transaction takes on its sender.
    fn unconfirmed_charge(tx: &Transaction, kind: TxKind) -> u64 {
        let amount = if kind.funds_from_nowhere() { 0 } else { tx.amount };
        let deposit = if tx.referenced_transaction_hash.is_some() {
            UNCONFIRMED_POOL_DEPOSIT
        } else {
            0
        };
        amount + tx.fee + deposit
    }

    /// Admit a transaction to the unconfirmed pool: debit the sender's
    /// unconfirmed balance, then run the kind hook; the debit is
    /// reversed if the hook rejects.
    pub fn apply_unconfirmed(
        &self,
        tx: &Transaction,
        stores: &mut MarketStores,
        height: Height,
    ) -> TxResult<()> {
        let kind = TxKind::of(&tx.attachment);
        let sender = tx.sender_id();
        let charge = Self::unconfirmed_charge(tx, kind);
        stores.accounts.debit_unconfirmed(sender, charge, height)?;

        let hook = self.apply_unconfirmed_hook(tx, stores, height);
        if let Err(err) = hook {
            stores.accounts.credit_unconfirmed(sender, charge, height)?;
            return Err(err);
        }
        Ok(())
    }

    fn apply_unconfirmed_hook(
        &self,
        tx: &Transaction,
        stores: &mut MarketStores,
        height: Height,
    ) -> TxResult<()> {
        match &tx.attachment {
            Attachment::ProofOfWork { work_id, .. } => {
                let work = stores.registry.get_open(*work_id)?;
                let unit = work.xel_per_pow;
                let remaining = stores
                    .registry
                    .remaining_pow_fund(*work_id, Some(&stores.guard));
                if remaining < unit {
                    return Err(TxError::InsufficientPowFund {
                        work_id: *work_id,
                        remaining,
                        required: unit,
                    });
                }
                stores.guard.reserve_pow(*work_id, tx.id(), unit);
                Ok(())
            }
            Attachment::Bounty { work_id, .. } => {
                let work = stores.registry.get_open(*work_id)?;
                let taken = stores.registry.bounty_slots_taken(*work_id, Some(&stores.guard));
                if taken >= work.bounty_limit {
                    return Err(TxError::BountySlotsExhausted {
                        work_id: *work_id,
                        limit: work.bounty_limit,
                    });
                }
                stores.guard.reserve_bounty(*work_id, tx.id());
                Ok(())
            }
            Attachment::BountyAnnouncement { .. } => stores.accounts.debit_unconfirmed(
                tx.sender_id(),
                DEPOSIT_BOUNTY_ANNOUNCEMENT,
                height,
            ),
            _ => Ok(()),
        }
    }

    /// Evict a transaction from the unconfirmed pool, reversing its
    /// hold and reservations.
    pub fn undo_unconfirmed(
        &self,
        tx: &Transaction,
        stores: &mut MarketStores,
        height: Height,
    ) -> TxResult<()> {
        match &tx.attachment {
            Attachment::ProofOfWork { work_id, .. } => {
                stores.guard.release_pow(*work_id, tx.id());
            }
            Attachment::Bounty { work_id, .. } => {
                stores.guard.release_bounty(*work_id, tx.id());
            }
            Attachment::BountyAnnouncement { .. } => {
                stores.accounts.credit_unconfirmed(
                    tx.sender_id(),
                    DEPOSIT_BOUNTY_ANNOUNCEMENT,
                    height,
                )?;
            }
            _ => {}
        }
        let kind = TxKind::of(&tx.attachment);
        stores
            .accounts
            .credit_unconfirmed(tx.sender_id(), Self::unconfirmed_charge(tx, kind), height)
    }

    /// Confirm a transaction inside block application.
    pub fn apply(
        &mut self,
        tx: &Transaction,
        stores: &mut MarketStores,
        block_id: EntityId,
        height: Height,
    ) -> TxResult<()> {
        let kind = TxKind::of(&tx.attachment);
        let sender = tx.sender_id();

        if !kind.funds_from_nowhere() {
            stores.accounts.debit_balance(sender, tx.amount + tx.fee, height)?;
        }
        if tx.referenced_transaction_hash.is_some() {
            // the pool deposit was only ever an unconfirmed hold
            stores
                .accounts
                .credit_unconfirmed(sender, UNCONFIRMED_POOL_DEPOSIT, height)?;
        }
        if let Some(recipient) = tx.recipient_id {
            stores
                .accounts
                .credit_balance_and_unconfirmed(recipient, tx.amount, height)?;
        }

        self.apply_hook(tx, stores, block_id, height)
    }

    fn apply_hook(
        &mut self,
        tx: &Transaction,
        stores: &mut MarketStores,
        block_id: EntityId,
        height: Height,
    ) -> TxResult<()> {
        match &tx.attachment {
            Attachment::OrdinaryPayment => Ok(()),
            Attachment::NewTask {
                title,
                deadline,
                bounty_limit,
                xel_per_pow,
                percentage_pow_fund,
            } => {
                let source = tx.source_code.as_ref().ok_or(TxError::MissingSourceCode)?;
                let work = Work::new(
                    tx.id(),
                    tx.sender_id(),
                    title.clone(),
                    tx.amount,
                    *xel_per_pow,
                    *percentage_pow_fund,
                    *bounty_limit,
                    *deadline,
                    height,
                );
                self.vm.compile(tx.id(), &source.source)?;
                stores.sources.insert(tx.id(), source, height);
                stores.registry.create_task(work, height)
            }
            Attachment::CancelTask { work_id } | Attachment::CancelTaskRequest { work_id } => {
                let (creator, refund) =
                    stores
                        .registry
                        .cancel(*work_id, CloseReason::Cancelled, height)?;
                stores
                    .accounts
                    .credit_balance_and_unconfirmed(creator, refund, height)
            }
            Attachment::ProofOfWork { work_id, input } => {
                let result = stores.registry.reduce_one_pow_submission(*work_id, height);
                let (payout, too_late) = match result {
                    Ok((creator, payout, refund)) => {
                        if refund > 0 {
                            // exhaustion close: the leftovers go home
                            stores
                                .accounts
                                .credit_balance_and_unconfirmed(creator, refund, height)?;
                        }
                        (payout, false)
                    }
                    Err(TxError::WorkClosed { .. }) | Err(TxError::UnknownWork { .. }) => {
                        warn!(work_id, tx_id = tx.id(), "pow confirmed against closed task");
                        (0, true)
                    }
                    Err(err) => return Err(err),
                };
                stores.ledger.insert_submission(
                    Submission {
                        id: tx.id(),
                        work_id: *work_id,
                        block_id,
                        account_id: tx.sender_id(),
                        is_pow: true,
                        input: input.clone(),
                        hash: content_hash(*work_id, input, true),
                        payout_amount: payout,
                        paid: !too_late,
                        too_late,
                    },
                    height,
                )?;
                if !too_late {
                    stores
                        .accounts
                        .credit_balance_and_unconfirmed(tx.sender_id(), payout, height)?;
                }
                stores.guard.release_pow(*work_id, tx.id());
                Ok(())
            }
            Attachment::Bounty { work_id, input } => {
                let result = stores.registry.kill_bounty_fund(*work_id, height);
                let (payout, too_late) = match result {
                    Ok((creator, payout, pow_refund)) => {
                        // the untouched pow fund goes home with the close
                        stores
                            .accounts
                            .credit_balance_and_unconfirmed(creator, pow_refund, height)?;
                        (payout, false)
                    }
                    Err(TxError::WorkClosed { .. }) | Err(TxError::UnknownWork { .. }) => {
                        warn!(work_id, tx_id = tx.id(), "bounty confirmed against closed task");
                        (0, true)
                    }
                    Err(err) => return Err(err),
                };
                stores.ledger.insert_submission(
                    Submission {
                        id: tx.id(),
                        work_id: *work_id,
                        block_id,
                        account_id: tx.sender_id(),
                        is_pow: false,
                        input: input.clone(),
                        hash: content_hash(*work_id, input, false),
                        payout_amount: payout,
                        paid: false,
                        too_late,
                    },
                    height,
                )?;
                stores.guard.release_bounty(*work_id, tx.id());
                Ok(())
            }
            Attachment::BountyPayout { submission_id, .. } => {
                stores.ledger.mark_paid(*submission_id, height)
            }
            Attachment::BountyAnnouncement {
                work_id,
                hash_announced,
            } => {
                stores.registry.register_announcement(*work_id, height)?;
                stores.ledger.insert_announcement(
                    SubmissionAnnouncement {
                        id: tx.id(),
                        work_id: *work_id,
                        account_id: tx.sender_id(),
                        hash_announced: hash_announced.clone(),
                        too_late: false,
                    },
                    height,
                )?;
                stores.accounts.credit_unconfirmed(
                    tx.sender_id(),
                    DEPOSIT_BOUNTY_ANNOUNCEMENT,
                    height,
                )
            }
        }
    }
}
