//! Exchange-rate ledger.
//!
//! Owns `tokenPool`, the base-asset value backing every outstanding voucher,
//! and drives the external voucher token so that pool and supply always move
//! together.
//!
//! ## Formula
//!
//! ```text
//! voucher = base * voucherSupply / tokenPool      (tokenPool > 0)
//! voucher = base                                  (tokenPool == 0, bootstrap 1:1)
//! base    = voucher * tokenPool / voucherSupply
//! ```
//!
//! Both directions floor, so rounding dust always stays with the pool.
//!
//! Every operation validates and computes first, then calls at most one
//! fallible collaborator, then commits its own state. A failed call leaves
//! pool, supply, queue and event log untouched.

use veth_math::{fixed, Amount};
use veth_types::access::ensure_role;
use veth_types::{
    AccessGate, Address, Event, LegacyToken, LiquiditySink, Role, TokenError, VoucherToken,
    DEAD_ADDRESS,
};

use crate::queue::{WithdrawalQueue, WithdrawalRecord};
use crate::{LedgerError, Result, FEE_RATE_DENOMINATOR};

/// Identities and fee settings fixed at genesis.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Administrator: fee settings, pause, role changes.
    pub owner: Address,
    /// Recipient of fee vouchers minted on every reward.
    pub fee_receiver: Address,
    /// Fee share of each reward, scaled by [`FEE_RATE_DENOMINATOR`].
    pub fee_rate: Amount,
    /// The only caller allowed to add or remove rewards.
    pub reward_reporter: Address,
}

/// The value-accounting engine of the pool.
#[derive(Debug)]
pub struct ExchangeRateLedger<V, L, S> {
    gate: AccessGate,
    token_pool: Amount,
    fee_rate: Amount,
    fee_receiver: Address,
    reward_reporter: Address,
    /// Base asset held for paying out withdrawals.
    balance: Amount,
    queue: WithdrawalQueue,
    voucher: V,
    legacy: L,
    sink: S,
    events: Vec<Event>,
}

impl<V, L, S> ExchangeRateLedger<V, L, S>
where
    V: VoucherToken,
    L: LegacyToken,
    S: LiquiditySink,
{
    /// Create the ledger at genesis.
    ///
    /// The voucher supply that already exists (the seed mint) is bound to an
    /// equal initial `tokenPool`, so the starting rate is 1:1.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::FeeRateOutOfRange`] if `config.fee_rate` exceeds 100%
    pub fn new(config: LedgerConfig, voucher: V, legacy: L, sink: S) -> Result<Self> {
        check_fee_rate(config.fee_rate)?;
        let token_pool = voucher.total_supply();

        tracing::info!(
            owner = %config.owner,
            fee_receiver = %config.fee_receiver,
            fee_rate = config.fee_rate,
            token_pool,
            "ledger initialised"
        );

        Ok(Self {
            gate: AccessGate::new(config.owner),
            token_pool,
            fee_rate: config.fee_rate,
            fee_receiver: config.fee_receiver,
            reward_reporter: config.reward_reporter,
            balance: 0,
            queue: WithdrawalQueue::new(),
            voucher,
            legacy,
            sink,
            events: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    /// Vouchers worth `base_amount` at the current rate.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Math`] if the result does not fit
    pub fn calculate_voucher_amount(&self, base_amount: Amount) -> Result<Amount> {
        if self.token_pool == 0 {
            return Ok(base_amount);
        }
        let supply = self.voucher.total_supply();
        Ok(fixed::mul_div(base_amount, supply, self.token_pool)?)
    }

    /// Base asset worth `voucher_amount` at the current rate.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Math`] if the result does not fit
    pub fn calculate_base_amount(&self, voucher_amount: Amount) -> Result<Amount> {
        let supply = self.voucher.total_supply();
        if supply == 0 {
            return Ok(voucher_amount);
        }
        Ok(fixed::mul_div(voucher_amount, self.token_pool, supply)?)
    }

    /// Base asset per whole voucher, scaled by 1e18.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Math`] if the rate does not fit
    pub fn exchange_rate(&self) -> Result<Amount> {
        self.calculate_base_amount(veth_math::SCALE)
    }

    // ------------------------------------------------------------------
    // User operations
    // ------------------------------------------------------------------

    /// Deposit `amount` of base asset and mint vouchers to `caller`.
    ///
    /// The base asset is forwarded to the liquidity sink.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Paused`] while paused
    /// - [`LedgerError::ZeroAmount`] if `amount` is zero
    /// - [`LedgerError::Token`] if the voucher mint fails
    pub fn deposit(&mut self, caller: &Address, amount: Amount) -> Result<Amount> {
        self.gate.ensure_not_paused()?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let voucher_amount = self.calculate_voucher_amount(amount)?;
        let token_pool = fixed::add(self.token_pool, amount)?;

        self.voucher.mint(caller, voucher_amount)?;
        self.token_pool = token_pool;
        self.sink.accept(caller, amount);

        tracing::info!(
            user = %caller,
            base_amount = amount,
            voucher_amount,
            token_pool,
            "deposited"
        );
        self.events.push(Event::Deposited {
            user: *caller,
            base_amount: amount,
            voucher_amount,
        });
        Ok(voucher_amount)
    }

    /// Retire `amount` legacy tokens and mint vouchers at the current rate.
    ///
    /// The legacy tokens go to [`DEAD_ADDRESS`]. `tokenPool` grows by
    /// `amount` although no base asset enters here: the legacy supply is
    /// already backed by stake the pool accounts for.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Paused`] while paused
    /// - [`LedgerError::ZeroAmount`] if `amount` is zero
    /// - [`LedgerError::Token`] if the caller lacks legacy balance or the
    ///   voucher mint fails
    pub fn convert_legacy(&mut self, caller: &Address, amount: Amount) -> Result<Amount> {
        self.gate.ensure_not_paused()?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let voucher_amount = self.calculate_voucher_amount(amount)?;
        let token_pool = fixed::add(self.token_pool, amount)?;

        let legacy_balance = self.legacy.balance_of(caller);
        if legacy_balance < amount {
            return Err(TokenError::InsufficientBalance {
                holder: *caller,
                balance: legacy_balance,
                required: amount,
            }
            .into());
        }

        self.voucher.mint(caller, voucher_amount)?;
        if let Err(err) = self.legacy.transfer_from(caller, &DEAD_ADDRESS, amount) {
            // Balance was checked above; undo the mint if the collaborator
            // still refuses.
            self.voucher.burn(caller, voucher_amount)?;
            return Err(err.into());
        }
        self.token_pool = token_pool;

        tracing::info!(
            user = %caller,
            base_amount = amount,
            voucher_amount,
            token_pool,
            "legacy tokens renewed"
        );
        self.events.push(Event::Renewed {
            user: *caller,
            base_amount: amount,
            voucher_amount,
        });
        Ok(voucher_amount)
    }

    /// Burn `voucher_amount` from `caller` and queue the base-asset claim.
    ///
    /// The claim is priced before the burn changes the supply.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Paused`] while paused
    /// - [`LedgerError::ZeroAmount`] if `voucher_amount` is zero
    /// - [`LedgerError::InsufficientPool`] if the claim exceeds `tokenPool`
    /// - [`LedgerError::Token`] if the caller holds too few vouchers
    pub fn withdraw_request(&mut self, caller: &Address, voucher_amount: Amount) -> Result<Amount> {
        self.gate.ensure_not_paused()?;
        if voucher_amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let base_amount = self.calculate_base_amount(voucher_amount)?;
        let token_pool =
            self.token_pool
                .checked_sub(base_amount)
                .ok_or(LedgerError::InsufficientPool {
                    requested: base_amount,
                    pool: self.token_pool,
                })?;

        // Plan before burning so a counter overflow cannot strand a burn.
        let (record, tail) = self.queue.plan(caller, base_amount)?;

        self.voucher.burn(caller, voucher_amount)?;
        self.token_pool = token_pool;
        self.queue.commit(caller, record, tail);

        tracing::info!(
            user = %caller,
            voucher_amount,
            base_amount,
            token_pool,
            queued_withdrawal = self.queue.queued_withdrawal(),
            "withdrawal requested"
        );
        self.events.push(Event::WithdrawalRequested {
            user: *caller,
            voucher_amount,
            base_amount,
        });
        Ok(base_amount)
    }

    /// Base asset `user` may claim right now.
    pub fn can_withdrawal_amount(&self, user: &Address) -> Amount {
        self.queue.available(user, self.balance)
    }

    /// Pay out `amount` of `caller`'s queued claim; `0` pays the maximum
    /// currently available.
    ///
    /// Returns the amount paid.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Paused`] while paused
    /// - [`LedgerError::ExceedPermittedAmount`] if `amount` exceeds the
    ///   caller's outstanding claim
    /// - [`LedgerError::InsufficientWithdrawalAmount`] if the liquidity that
    ///   has arrived does not cover `amount`
    pub fn withdraw_complete(&mut self, caller: &Address, amount: Amount) -> Result<Amount> {
        self.gate.ensure_not_paused()?;

        let paid = self.queue.complete(caller, amount, self.balance)?;
        // paid <= available <= balance
        self.balance -= paid;

        tracing::info!(
            user = %caller,
            amount = paid,
            balance = self.balance,
            completed_withdrawal = self.queue.completed_withdrawal(),
            "withdrawal completed"
        );
        self.events.push(Event::WithdrawalCompleted {
            user: *caller,
            amount: paid,
        });
        Ok(paid)
    }

    /// Base asset arriving from exited stake to fund queued withdrawals.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAmount`] if `amount` is zero
    /// - [`LedgerError::Math`] if the balance would overflow
    pub fn receive_liquidity(&mut self, from: &Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        self.balance = fixed::add(self.balance, amount)?;
        tracing::debug!(%from, amount, balance = self.balance, "withdrawal liquidity received");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reward reporting
    // ------------------------------------------------------------------

    /// Add a realized reward to the pool and mint the protocol fee.
    ///
    /// The fee is `voucherEquivalent(amount) * feeRate / FEE_RATE_DENOMINATOR`
    /// priced at the rate in force when the reward is reported, and is
    /// minted to the fee receiver. The fee therefore dilutes every holder
    /// instead of coming out of the reward.
    ///
    /// Returns the fee vouchers minted.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] unless `caller` is the reward reporter
    /// - [`LedgerError::ZeroAmount`] if `amount` is zero
    pub fn add_reward(&mut self, caller: &Address, amount: Amount) -> Result<Amount> {
        ensure_role(Role::RewardReporter, &self.reward_reporter, caller)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let reward_vouchers = self.calculate_voucher_amount(amount)?;
        let fee = fixed::mul_div(reward_vouchers, self.fee_rate, FEE_RATE_DENOMINATOR)?;
        let token_pool = fixed::add(self.token_pool, amount)?;

        self.voucher.mint(&self.fee_receiver, fee)?;
        self.token_pool = token_pool;

        tracing::info!(
            reporter = %caller,
            amount,
            fee,
            token_pool,
            supply = self.voucher.total_supply(),
            "reward added"
        );
        self.events.push(Event::RewardAdded {
            reporter: *caller,
            amount,
            fee,
        });
        Ok(fee)
    }

    /// Remove a penalty from the pool.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] unless `caller` is the reward reporter
    /// - [`LedgerError::ZeroAmount`] if `amount` is zero
    /// - [`LedgerError::InsufficientPool`] if `amount` exceeds `tokenPool`
    pub fn remove_reward(&mut self, caller: &Address, amount: Amount) -> Result<()> {
        ensure_role(Role::RewardReporter, &self.reward_reporter, caller)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        self.token_pool =
            self.token_pool
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientPool {
                    requested: amount,
                    pool: self.token_pool,
                })?;

        tracing::info!(reporter = %caller, amount, token_pool = self.token_pool, "reward removed");
        self.events.push(Event::RewardRemoved {
            reporter: *caller,
            amount,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Set the fee rate. Owner only; `0..=FEE_RATE_DENOMINATOR`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] unless `caller` is the owner
    /// - [`LedgerError::FeeRateOutOfRange`] above 100%
    pub fn set_fee_rate(&mut self, caller: &Address, fee_rate: Amount) -> Result<()> {
        self.gate.ensure_owner(caller)?;
        check_fee_rate(fee_rate)?;
        tracing::info!(previous = self.fee_rate, fee_rate, "fee rate updated");
        self.fee_rate = fee_rate;
        Ok(())
    }

    /// Set the fee receiver. Owner only.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] unless `caller` is the owner
    pub fn set_fee_receiver(&mut self, caller: &Address, fee_receiver: Address) -> Result<()> {
        self.gate.ensure_owner(caller)?;
        tracing::info!(%fee_receiver, "fee receiver updated");
        self.fee_receiver = fee_receiver;
        Ok(())
    }

    /// Set the reward reporter. Owner only.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] unless `caller` is the owner
    pub fn set_reward_reporter(&mut self, caller: &Address, reporter: Address) -> Result<()> {
        self.gate.ensure_owner(caller)?;
        tracing::warn!(%reporter, "reward reporter updated");
        self.reward_reporter = reporter;
        Ok(())
    }

    /// Pause user-facing operations. Owner only.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] unless `caller` is the owner
    pub fn pause(&mut self, caller: &Address) -> Result<()> {
        Ok(self.gate.pause(caller)?)
    }

    /// Resume user-facing operations. Owner only.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] unless `caller` is the owner
    pub fn unpause(&mut self, caller: &Address) -> Result<()> {
        Ok(self.gate.unpause(caller)?)
    }

    /// Hand ownership to `new_owner`. Owner only.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] unless `caller` is the owner
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<()> {
        Ok(self.gate.transfer_ownership(caller, new_owner)?)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Total base-asset value backing all vouchers.
    pub fn token_pool(&self) -> Amount {
        self.token_pool
    }

    /// Vouchers outstanding.
    pub fn voucher_supply(&self) -> Amount {
        self.voucher.total_supply()
    }

    /// Base asset held for withdrawals.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Fee share of each reward, scaled by [`FEE_RATE_DENOMINATOR`].
    pub fn fee_rate(&self) -> Amount {
        self.fee_rate
    }

    /// Recipient of fee vouchers.
    pub fn fee_receiver(&self) -> Address {
        self.fee_receiver
    }

    /// The caller allowed to add and remove rewards.
    pub fn reward_reporter(&self) -> Address {
        self.reward_reporter
    }

    /// Current administrator.
    pub fn owner(&self) -> Address {
        self.gate.owner()
    }

    /// Whether user-facing operations are paused.
    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    /// The withdrawal record of `user`.
    pub fn withdrawal(&self, user: &Address) -> WithdrawalRecord {
        self.queue.record(user)
    }

    /// Cumulative base asset ever requested for withdrawal.
    pub fn queued_withdrawal(&self) -> Amount {
        self.queue.queued_withdrawal()
    }

    /// Cumulative base asset ever paid out.
    pub fn completed_withdrawal(&self) -> Amount {
        self.queue.completed_withdrawal()
    }

    /// The voucher token collaborator.
    pub fn voucher(&self) -> &V {
        &self.voucher
    }

    /// The legacy token collaborator.
    pub fn legacy(&self) -> &L {
        &self.legacy
    }

    /// Mutable access to the legacy token, for issuing fixtures.
    pub fn legacy_mut(&mut self) -> &mut L {
        &mut self.legacy
    }

    /// The liquidity sink deposits are forwarded to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

fn check_fee_rate(fee_rate: Amount) -> Result<()> {
    if fee_rate > FEE_RATE_DENOMINATOR {
        return Err(LedgerError::FeeRateOutOfRange { rate: fee_rate });
    }
    Ok(())
}
