//! # Task Records
//!
//! A `Work` row is created by a NEW_TASK transaction and mutated by every
//! accepted submission or cancellation referencing it. All mutations go
//! through the methods here so the fund invariants hold at every version:
//! `balance_pow_fund + pow payouts == pow fund` and the two funds always
//! split `original_amount` exactly.

use serde::{Deserialize, Serialize};
use xel_storage::VersionedRow;
use xel_types::errors::{TxError, TxResult};
use xel_types::{AccountId, EntityId, Height};

/// Why a task stopped accepting submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// The creator cancelled it.
    Cancelled,
    /// Its deadline height passed.
    Timeout,
    /// The pow fund can no longer cover a unit reward.
    FundsExhausted,
    /// A bounty was accepted and took the bounty fund.
    BountyClaimed,
}

/// A funded computational task posted on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    /// Id of the creating transaction.
    pub id: EntityId,
    /// Account that posted and funded the task.
    pub creator_id: AccountId,
    /// Human-readable title.
    pub title: String,
    /// Reward per accepted proof-of-work unit, in base units.
    pub xel_per_pow: u64,
    /// Share of the funding routed to the pow fund (percent).
    pub percentage_pow_fund: u8,
    /// Maximum accepted bounty submissions.
    pub bounty_limit: u32,
    /// Total funding escrowed at creation, in base units.
    pub original_amount: u64,
    /// Remaining pow fund, in base units.
    pub balance_pow_fund: u64,
    /// Remaining bounty fund, in base units.
    pub balance_bounty_fund: u64,
    /// Height of the creating block.
    pub originating_height: Height,
    /// Absolute height at which the task times out.
    pub timeout_height: Height,
    /// Whether the task has stopped accepting submissions.
    pub closed: bool,
    /// Why it closed, once it has.
    pub close_reason: Option<CloseReason>,
    /// Accepted proof-of-work submissions so far.
    pub received_pows: u32,
    /// Accepted bounty submissions so far.
    pub received_bounties: u32,
    /// Registered bounty announcements so far.
    pub received_announcements: u32,
}

impl Work {
    /// Create a task, splitting `amount` between the two funds.
    ///
    /// `pow = amount * pct / 100` and `bounty = amount * (100 - pct) / 100`,
    /// both rounded down; the rounding remainder goes to the pow fund so
    /// the two funds always sum to `amount` exactly.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EntityId,
        creator_id: AccountId,
        title: String,
        amount: u64,
        xel_per_pow: u64,
        percentage_pow_fund: u8,
        bounty_limit: u32,
        deadline: u16,
        originating_height: Height,
    ) -> Self {
        let pct = u64::from(percentage_pow_fund);
        let pow = amount / 100 * pct + amount % 100 * pct / 100;
        let bounty = amount / 100 * (100 - pct) + amount % 100 * (100 - pct) / 100;
        let remainder = amount - pow - bounty;
        Self {
            id,
            creator_id,
            title,
            xel_per_pow,
            percentage_pow_fund,
            bounty_limit,
            original_amount: amount,
            balance_pow_fund: pow + remainder,
            balance_bounty_fund: bounty,
            originating_height,
            timeout_height: originating_height + Height::from(deadline),
            closed: false,
            close_reason: None,
            received_pows: 0,
            received_bounties: 0,
            received_announcements: 0,
        }
    }

    /// Whether the task still accepts submissions.
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Pay one proof-of-work unit out of the pow fund.
    ///
    /// Closes the task once the remaining fund cannot cover another unit;
    /// the close drains what is left of both funds back to the creator.
    /// Returns `(payout, creator_refund)`.
    pub fn reduce_one_pow_submission(&mut self) -> TxResult<(u64, u64)> {
        if self.closed {
            return Err(TxError::WorkClosed { work_id: self.id });
        }
        if self.balance_pow_fund < self.xel_per_pow {
            return Err(TxError::InsufficientPowFund {
                work_id: self.id,
                remaining: self.balance_pow_fund,
                required: self.xel_per_pow,
            });
        }
        self.balance_pow_fund -= self.xel_per_pow;
        self.received_pows += 1;
        let mut refund = 0;
        if self.balance_pow_fund < self.xel_per_pow {
            refund = self.balance_pow_fund + self.balance_bounty_fund;
            self.balance_pow_fund = 0;
            self.balance_bounty_fund = 0;
            self.closed = true;
            self.close_reason = Some(CloseReason::FundsExhausted);
        }
        Ok((self.xel_per_pow, refund))
    }

    /// Pay the whole bounty fund to the first accepted bounty and close.
    ///
    /// The unspent remainder of the pow fund goes back to the creator.
    /// Returns `(payout, pow_refund)`.
    pub fn kill_bounty_fund(&mut self) -> TxResult<(u64, u64)> {
        if self.closed {
            return Err(TxError::WorkClosed { work_id: self.id });
        }
        let payout = self.balance_bounty_fund;
        let pow_refund = self.balance_pow_fund;
        self.balance_bounty_fund = 0;
        self.balance_pow_fund = 0;
        self.received_bounties += 1;
        self.closed = true;
        self.close_reason = Some(CloseReason::BountyClaimed);
        Ok((payout, pow_refund))
    }

    /// Register one bounty announcement against the announcement limit.
    pub fn register_announcement(&mut self) -> TxResult<()> {
        if self.closed {
            return Err(TxError::WorkClosed { work_id: self.id });
        }
        if self.received_announcements >= self.bounty_limit {
            return Err(TxError::AnnouncementSlotsExhausted {
                work_id: self.id,
                limit: self.bounty_limit,
            });
        }
        self.received_announcements += 1;
        Ok(())
    }

    /// Close the task and drain both funds back to the caller.
    ///
    /// Returns the total refund.
    pub fn close(&mut self, reason: CloseReason) -> TxResult<u64> {
        if self.closed {
            return Err(TxError::WorkClosed { work_id: self.id });
        }
        let refund = self.balance_pow_fund + self.balance_bounty_fund;
        self.balance_pow_fund = 0;
        self.balance_bounty_fund = 0;
        self.closed = true;
        self.close_reason = Some(reason);
        Ok(refund)
    }
}

impl VersionedRow for Work {
    fn row_id(&self) -> EntityId {
        self.id
    }
}
