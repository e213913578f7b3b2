//! Counter-based FIFO withdrawal queue.
//!
//! The queue is a number line of base-asset value. Every request occupies
//! the range `[queued, queued + pending)` of one user's record, and the
//! global `queued_withdrawal` counter is the tail of the line. Liquidity
//! ever received by the ledger is `completed_withdrawal + balance`; a user
//! may claim whatever part of their range that liquidity already covers.
//!
//! ```text
//! available = min(pending, completed + balance - queued, balance)
//! ```
//!
//! Completing a withdrawal moves `queued` forward by the paid amount and
//! adds the same amount to `completed`, so one user's payout never changes
//! another user's availability.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use veth_math::{fixed, Amount};
use veth_types::Address;

use crate::{LedgerError, Result};

/// One user's outstanding redemption claim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    /// Base asset requested and not yet paid.
    pub pending: Amount,
    /// Queue position where the unpaid part of the claim starts.
    pub queued: Amount,
}

impl WithdrawalRecord {
    /// Where the claim ends on the queue line.
    pub fn end(&self) -> Amount {
        self.queued.saturating_add(self.pending)
    }
}

/// Per-user records plus the two global counters.
#[derive(Debug, Clone, Default)]
pub struct WithdrawalQueue {
    records: HashMap<Address, WithdrawalRecord>,
    queued_withdrawal: Amount,
    completed_withdrawal: Amount,
}

impl WithdrawalQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The record for `user`; a zeroed record if they never requested.
    pub fn record(&self, user: &Address) -> WithdrawalRecord {
        self.records.get(user).copied().unwrap_or_default()
    }

    /// Cumulative base asset ever requested.
    pub fn queued_withdrawal(&self) -> Amount {
        self.queued_withdrawal
    }

    /// Cumulative base asset ever paid out.
    pub fn completed_withdrawal(&self) -> Amount {
        self.completed_withdrawal
    }

    /// Work out where a claim of `base_amount` for `user` would land,
    /// without touching the queue.
    ///
    /// A first request (or one made after everything was paid) starts at
    /// the current tail. A request stacked on an unpaid claim re-anchors the
    /// whole claim so that it ends at the new tail; the user never moves
    /// ahead of where their earlier claim started.
    ///
    /// Returns the updated record and the new tail.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Math`] if a counter would overflow
    pub fn plan(&self, user: &Address, base_amount: Amount) -> Result<(WithdrawalRecord, Amount)> {
        let current = self.record(user);
        let tail = fixed::add(self.queued_withdrawal, base_amount)?;
        let pending = fixed::add(current.pending, base_amount)?;
        // current.end() <= queued_withdrawal, so this cannot underflow.
        let queued = fixed::sub(self.queued_withdrawal, current.pending)?;
        Ok((WithdrawalRecord { pending, queued }, tail))
    }

    /// Store a record and tail produced by [`Self::plan`].
    pub fn commit(&mut self, user: &Address, record: WithdrawalRecord, tail: Amount) {
        self.records.insert(*user, record);
        self.queued_withdrawal = tail;

        tracing::debug!(
            %user,
            queued = record.queued,
            pending = record.pending,
            tail,
            "withdrawal queue: claim enqueued"
        );
    }

    /// Append a claim of `base_amount` for `user` at the tail of the queue.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Math`] if a counter would overflow
    pub fn enqueue(&mut self, user: &Address, base_amount: Amount) -> Result<WithdrawalRecord> {
        let (record, tail) = self.plan(user, base_amount)?;
        self.commit(user, record, tail);
        Ok(record)
    }

    /// What `user` can claim right now given the ledger's spendable `balance`.
    pub fn available(&self, user: &Address, balance: Amount) -> Amount {
        let record = self.record(user);
        let received = self.completed_withdrawal.saturating_add(balance);
        let covered = received.saturating_sub(record.queued);
        record.pending.min(covered).min(balance)
    }

    /// Pay out part or all of `user`'s claim.
    ///
    /// `requested == 0` means "everything currently available".
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ExceedPermittedAmount`] if `requested` exceeds the
    ///   user's outstanding claim
    /// - [`LedgerError::InsufficientWithdrawalAmount`] if nothing is
    ///   available or `requested` exceeds what liquidity covers
    /// - [`LedgerError::Math`] if the completed counter would overflow
    pub fn complete(&mut self, user: &Address, requested: Amount, balance: Amount) -> Result<Amount> {
        let record = self.record(user);
        if requested > record.pending {
            return Err(LedgerError::ExceedPermittedAmount {
                requested,
                permitted: record.pending,
            });
        }

        let available = self.available(user, balance);
        let amount = if requested == 0 { available } else { requested };
        if amount == 0 || amount > available {
            return Err(LedgerError::InsufficientWithdrawalAmount {
                requested: amount,
                available,
            });
        }

        let completed = fixed::add(self.completed_withdrawal, amount)?;
        let updated = WithdrawalRecord {
            pending: record.pending - amount,
            queued: record.queued + amount,
        };
        self.records.insert(*user, updated);
        self.completed_withdrawal = completed;

        tracing::debug!(
            %user,
            amount,
            pending = updated.pending,
            completed,
            "withdrawal queue: claim paid"
        );

        Ok(amount)
    }
}
