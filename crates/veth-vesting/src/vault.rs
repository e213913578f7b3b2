//! The reward vesting vault.
//!
//! Anyone may pay a reward lump into the vault. Only the operator may drip,
//! and only once per day bucket. A drip forwards everything vested and not
//! yet forwarded to the liquidity sink; a drip that finds nothing vested
//! still succeeds and records a zero-valued event.

use veth_math::Amount;
use veth_types::access::ensure_role;
use veth_types::time::{day_floor, day_index};
use veth_types::{AccessGate, Address, Event, LiquiditySink, Role, Timestamp};

use crate::schedule::RewardSchedule;
use crate::{Result, VestingError, MIN_REWARD_AMOUNT, REWARD_DURATION_DAYS};

/// Identities and schedule parameters fixed at genesis.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Identity the vault forwards drips from.
    pub address: Address,
    /// Administrator: operator changes and ownership.
    pub owner: Address,
    /// The only caller allowed to drip.
    pub operator: Address,
    /// Vesting window length in days.
    pub window_days: u64,
    /// Dust floor for incoming rewards, in base units.
    pub min_reward: Amount,
}

impl VaultConfig {
    /// A config with the protocol's default window and dust floor.
    pub fn new(address: Address, owner: Address, operator: Address) -> Self {
        Self {
            address,
            owner,
            operator,
            window_days: REWARD_DURATION_DAYS,
            min_reward: MIN_REWARD_AMOUNT,
        }
    }
}

/// Smooths lump rewards into a daily drip towards the liquidity sink.
#[derive(Debug)]
pub struct RewardVestingVault<S> {
    address: Address,
    gate: AccessGate,
    operator: Address,
    window_days: u64,
    min_reward: Amount,
    schedule: RewardSchedule,
    /// Day bucket of the last drip; none before the first.
    last_drip_day: Option<u64>,
    sink: S,
    events: Vec<Event>,
}

impl<S: LiquiditySink> RewardVestingVault<S> {
    /// Create the vault with an empty schedule anchored at `genesis`.
    ///
    /// # Errors
    ///
    /// - [`VestingError::InvalidConfig`] if the window is zero days long
    pub fn new(config: VaultConfig, sink: S, genesis: Timestamp) -> Result<Self> {
        if config.window_days == 0 {
            return Err(VestingError::InvalidConfig(
                "window_days must be positive".to_string(),
            ));
        }

        let schedule = RewardSchedule::genesis(genesis);
        tracing::info!(
            owner = %config.owner,
            operator = %config.operator,
            sink = %sink.address(),
            window_days = config.window_days,
            genesis_day = day_floor(genesis),
            "vesting vault initialised"
        );

        Ok(Self {
            address: config.address,
            gate: AccessGate::new(config.owner),
            operator: config.operator,
            window_days: config.window_days,
            min_reward: config.min_reward,
            schedule,
            last_drip_day: None,
            sink,
            events: Vec::new(),
        })
    }

    /// Accept a reward lump from `payer` at time `now`.
    ///
    /// # Errors
    ///
    /// - [`VestingError::RewardTooLow`] below the dust floor
    /// - [`VestingError::Math`] on overflow
    pub fn receive_reward(&mut self, payer: &Address, amount: Amount, now: Timestamp) -> Result<()> {
        if amount < self.min_reward {
            return Err(VestingError::RewardTooLow {
                amount,
                minimum: self.min_reward,
            });
        }

        self.schedule.receive(amount, now, self.window_days)?;

        tracing::info!(
            %payer,
            amount,
            total = self.schedule.total,
            per_day = self.schedule.per_day,
            pending = self.schedule.pending,
            finish_at = self.schedule.finish_at,
            "vault reward received"
        );
        self.events.push(Event::RewardReceived {
            payer: *payer,
            amount,
        });
        Ok(())
    }

    /// Forward everything vested at `now` to the liquidity sink.
    ///
    /// Returns the amount forwarded, possibly zero.
    ///
    /// # Errors
    ///
    /// - [`VestingError::CallerNotOperator`] unless `caller` is the operator
    /// - [`VestingError::PaidToday`] if a drip already ran in this day bucket
    pub fn drip(&mut self, caller: &Address, now: Timestamp) -> Result<Amount> {
        ensure_role(Role::Operator, &self.operator, caller).map_err(VestingError::from_access)?;

        let day = day_index(now);
        if self.last_drip_day == Some(day) {
            return Err(VestingError::PaidToday { day });
        }

        let amount = self.schedule.pay(now)?;
        self.last_drip_day = Some(day);
        if amount > 0 {
            self.sink.accept(&self.address, amount);
        }

        let sink = self.sink.address();
        tracing::info!(
            operator = %caller,
            %sink,
            amount,
            paid = self.schedule.paid,
            total = self.schedule.total,
            "vault reward dripped"
        );
        self.events.push(Event::VaultRewardAdded {
            operator: *caller,
            sink,
            amount,
        });
        Ok(amount)
    }

    /// What a drip at `now` would forward.
    ///
    /// # Errors
    ///
    /// - [`VestingError::Math`] on overflow
    pub fn claimable(&self, now: Timestamp) -> Result<Amount> {
        self.schedule.claimable(now)
    }

    /// Replace the operator. Owner only.
    ///
    /// # Errors
    ///
    /// - [`VestingError::Unauthorized`] unless `caller` is the owner
    pub fn set_operator(&mut self, caller: &Address, operator: Address) -> Result<()> {
        self.gate.ensure_owner(caller).map_err(VestingError::from_access)?;
        tracing::warn!(previous = %self.operator, %operator, "vault operator updated");
        self.operator = operator;
        Ok(())
    }

    /// Hand ownership to `new_owner`. Owner only.
    ///
    /// # Errors
    ///
    /// - [`VestingError::Unauthorized`] unless `caller` is the owner
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<()> {
        self.gate
            .transfer_ownership(caller, new_owner)
            .map_err(VestingError::from_access)
    }

    /// Current schedule state.
    pub fn reward(&self) -> &RewardSchedule {
        &self.schedule
    }

    /// Identity drips are forwarded from.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Current administrator.
    pub fn owner(&self) -> Address {
        self.gate.owner()
    }

    /// The caller allowed to drip.
    pub fn operator(&self) -> Address {
        self.operator
    }

    /// Vesting window length in days.
    pub fn window_days(&self) -> u64 {
        self.window_days
    }

    /// Dust floor for incoming rewards.
    pub fn min_reward(&self) -> Amount {
        self.min_reward
    }

    /// Day bucket of the most recent drip.
    pub fn last_drip_day(&self) -> Option<u64> {
        self.last_drip_day
    }

    /// The liquidity sink drips go to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
