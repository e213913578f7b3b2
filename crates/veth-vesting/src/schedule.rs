//! Per-day linear vesting schedule.
//!
//! ## Formula
//!
//! ```text
//! unvested(today) = perDay * (finishAt - today) / DAY      (today < finishAt)
//! perDay'         = (unvested(today) + amount) / windowDays
//! finishAt'       = today + windowDays * DAY
//! claimable       = min(pending + perDay * vestedDays, total - paid)
//! ```
//!
//! Every timestamp is truncated to its day bucket before it touches the
//! schedule, so elapsed time is always a whole number of days.
//!
//! Two cursors are kept apart. `accrued_at` marks how far vesting has been
//! settled into `pending` and moves whenever a new reward re-rates the
//! schedule. `last_paid_at` marks how far vesting has been forwarded and
//! moves only when the operator drips.

use serde::{Deserialize, Serialize};
use veth_math::{fixed, Amount, MathError};
use veth_types::time::{day_floor, DAY_SECONDS};
use veth_types::Timestamp;

use crate::Result;

/// State of the vesting vault.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSchedule {
    /// Cumulative rewards ever received.
    pub total: Amount,
    /// Value vesting per day under the current window.
    pub per_day: Amount,
    /// Cumulative value forwarded by drips.
    pub paid: Amount,
    /// Vested value settled at a re-rate and not yet forwarded.
    pub pending: Amount,
    /// Day up to which vesting is settled into `pending`.
    pub accrued_at: Timestamp,
    /// Day up to which vesting has been forwarded.
    pub last_paid_at: Timestamp,
    /// Day the current window ends.
    pub finish_at: Timestamp,
}

impl RewardSchedule {
    /// An empty schedule whose window opens and closes on the genesis day.
    pub fn genesis(now: Timestamp) -> Self {
        let today = day_floor(now);
        Self {
            accrued_at: today,
            last_paid_at: today,
            finish_at: today,
            ..Self::default()
        }
    }

    /// Value received but not yet forwarded.
    pub fn outstanding(&self) -> Amount {
        self.total.saturating_sub(self.paid)
    }

    /// Value the current window will still release after `now`.
    pub fn unvested(&self, now: Timestamp) -> Result<Amount> {
        let today = day_floor(now);
        if today >= self.finish_at {
            return Ok(0);
        }
        let days = (self.finish_at - today) / DAY_SECONDS;
        Ok(self.per_day.checked_mul(Amount::from(days)).ok_or(MathError::Overflow)?)
    }

    /// Vested under the current rate since `accrued_at`, not yet settled.
    fn vested_since_accrual(&self, today: Timestamp) -> Result<Amount> {
        let until = today.min(self.finish_at);
        let days = until.saturating_sub(self.accrued_at) / DAY_SECONDS;
        Ok(self.per_day.checked_mul(Amount::from(days)).ok_or(MathError::Overflow)?)
    }

    /// What a drip at `now` would forward.
    pub fn claimable(&self, now: Timestamp) -> Result<Amount> {
        let today = day_floor(now);
        let vested = fixed::add(self.pending, self.vested_since_accrual(today)?)?;
        Ok(vested.min(self.outstanding()))
    }

    /// Fold vesting up to `today` into `pending`.
    fn settle(&mut self, today: Timestamp) -> Result<()> {
        let vested = self.vested_since_accrual(today)?;
        self.pending = fixed::add(self.pending, vested)?;
        self.accrued_at = self.accrued_at.max(today.min(self.finish_at));
        Ok(())
    }

    /// Blend a new reward lump into the schedule and restart the window at
    /// `now`.
    ///
    /// # Errors
    ///
    /// - [`crate::VestingError::Math`] on overflow
    pub fn receive(&mut self, amount: Amount, now: Timestamp, window_days: u64) -> Result<()> {
        let today = day_floor(now);
        let remaining = self.unvested(today)?;
        let vesting = fixed::add(remaining, amount)?;
        let per_day = vesting / Amount::from(window_days.max(1));
        let finish_at = window_days
            .checked_mul(DAY_SECONDS)
            .and_then(|window| today.checked_add(window))
            .ok_or(MathError::Overflow)?;

        let mut next = *self;
        next.total = fixed::add(self.total, amount)?;
        next.settle(today)?;
        next.accrued_at = today;
        next.per_day = per_day;
        next.finish_at = finish_at;

        *self = next;
        Ok(())
    }

    /// Settle and release everything claimable at `now`; returns the amount.
    ///
    /// # Errors
    ///
    /// - [`crate::VestingError::Math`] on overflow
    pub fn pay(&mut self, now: Timestamp) -> Result<Amount> {
        let today = day_floor(now);
        let mut next = *self;
        next.settle(today)?;

        let payable = next.pending.min(next.outstanding());
        next.pending -= payable;
        next.paid += payable;
        next.last_paid_at = next.last_paid_at.max(today.min(next.finish_at));

        *self = next;
        Ok(payable)
    }
}
