//! # Account Ledger
//!
//! Balance and unconfirmed-balance bookkeeping per account, stored as
//! height-versioned rows so rollback restores balances exactly. The
//! confirmed balance changes only inside block application; the
//! unconfirmed balance additionally carries pool-side holds and is reset
//! to the confirmed balance when the pool is flushed after a reorg.

use serde::{Deserialize, Serialize};
use tracing::trace;
use xel_storage::{VersionedRow, VersionedTable};
use xel_types::errors::{TxError, TxResult};
use xel_types::{AccountId, Height};

/// One account's balances, in base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Numeric account id.
    pub id: AccountId,
    /// Confirmed balance.
    pub balance: u64,
    /// Balance net of unconfirmed spends and holds.
    pub unconfirmed_balance: u64,
}

impl VersionedRow for Account {
    fn row_id(&self) -> AccountId {
        self.id
    }
}

/// Height-versioned account store.
#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    accounts: VersionedTable<Account>,
}

impl AccountLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            accounts: VersionedTable::new(),
        }
    }

    /// Confirmed balance of an account (0 if unknown).
    pub fn balance(&self, id: AccountId) -> u64 {
        self.accounts.latest(id).map_or(0, |a| a.balance)
    }

    /// Unconfirmed balance of an account (0 if unknown).
    pub fn unconfirmed_balance(&self, id: AccountId) -> u64 {
        self.accounts.latest(id).map_or(0, |a| a.unconfirmed_balance)
    }

    /// Stake used for forging, in whole XEL.
    pub fn effective_balance_xel(&self, id: AccountId) -> u64 {
        self.balance(id) / xel_types::constants::ONE_XEL
    }

    /// Seed an account at genesis with equal confirmed and unconfirmed
    /// balance.
    pub fn seed(&mut self, id: AccountId, amount: u64) -> TxResult<()> {
        self.accounts
            .insert(
                Account {
                    id,
                    balance: amount,
                    unconfirmed_balance: amount,
                },
                0,
            )
            .map_err(Into::into)
    }

    fn mutate<F>(&mut self, id: AccountId, height: Height, f: F) -> TxResult<()>
    where
        F: FnOnce(&mut Account) -> TxResult<()>,
    {
        let mut account = self
            .accounts
            .latest(id)
            .cloned()
            .unwrap_or(Account {
                id,
                balance: 0,
                unconfirmed_balance: 0,
            });
        f(&mut account)?;
        self.accounts.insert(account, height)?;
        Ok(())
    }

    /// Hold funds against the unconfirmed balance.
    pub fn debit_unconfirmed(&mut self, id: AccountId, amount: u64, height: Height) -> TxResult<()> {
        self.mutate(id, height, |account| {
            account.unconfirmed_balance = account
                .unconfirmed_balance
                .checked_sub(amount)
                .ok_or(TxError::InsufficientBalance {
                    account_id: id,
                    required: amount,
                })?;
            trace!(id, amount, "unconfirmed debit");
            Ok(())
        })
    }

    /// Release a previous unconfirmed hold.
    pub fn credit_unconfirmed(&mut self, id: AccountId, amount: u64, height: Height) -> TxResult<()> {
        self.mutate(id, height, |account| {
            account.unconfirmed_balance += amount;
            trace!(id, amount, "unconfirmed credit");
            Ok(())
        })
    }

    /// Spend confirmed funds inside block application.
    pub fn debit_balance(&mut self, id: AccountId, amount: u64, height: Height) -> TxResult<()> {
        self.mutate(id, height, |account| {
            account.balance =
                account
                    .balance
                    .checked_sub(amount)
                    .ok_or(TxError::InsufficientBalance {
                        account_id: id,
                        required: amount,
                    })?;
            trace!(id, amount, "balance debit");
            Ok(())
        })
    }

    /// Credit confirmed and unconfirmed balance together (payouts,
    /// refunds, forger fees, payment recipients).
    pub fn credit_balance_and_unconfirmed(
        &mut self,
        id: AccountId,
        amount: u64,
        height: Height,
    ) -> TxResult<()> {
        self.mutate(id, height, |account| {
            account.balance += amount;
            account.unconfirmed_balance += amount;
            trace!(id, amount, "balance credit");
            Ok(())
        })
    }

    /// Delete versions above `height` and restore earlier balances.
    pub fn rollback_to(&mut self, height: Height) -> usize {
        self.accounts.rollback_to(height)
    }

    /// Reset every unconfirmed balance to the confirmed balance.
    ///
    /// Called after a reorg flushes the unconfirmed pool; the rewritten
    /// rows overwrite each account's latest version in place.
    pub fn reset_unconfirmed(&mut self) -> TxResult<()> {
        let stale: Vec<(Account, Height)> = self
            .accounts
            .all_latest()
            .filter(|a| a.unconfirmed_balance != a.balance)
            .map(|a| {
                let height = self.accounts.latest_height(a.id).unwrap_or(0);
                (a.clone(), height)
            })
            .collect();
        for (mut account, height) in stale {
            account.unconfirmed_balance = account.balance;
            self.accounts.insert(account, height)?;
        }
        Ok(())
    }
}
