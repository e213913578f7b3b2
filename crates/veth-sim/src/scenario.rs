//! Scenario files and the protocol they drive.
//!
//! A scenario is a JSON array of steps:
//!
//! ```json
//! [
//!   { "at": 1700000000, "op": "deposit", "user": "0x11…11", "amount": "1.5" },
//!   { "at": 1700086400, "op": "vault_drip" }
//! ]
//! ```
//!
//! Amounts are decimal strings with up to 18 fractional digits. Privileged
//! ops default their caller to the configured role holder.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use veth_ledger::{ExchangeRateLedger, LedgerConfig};
use veth_math::{units::format_units, units::parse_units, Amount};
use veth_types::capability::{MemorySink, MemoryToken};
use veth_types::{Address, Event, LiquiditySink, Timestamp};
use veth_vesting::{RewardVestingVault, VaultConfig};

use crate::config::SimConfig;

/// Ledger wired to in-memory collaborators.
pub type SimLedger = ExchangeRateLedger<MemoryToken, MemoryToken, MemorySink>;

/// Vault wired to an in-memory sink.
pub type SimVault = RewardVestingVault<MemorySink>;

/// One scenario step.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Unix seconds at which the step happens.
    pub at: Timestamp,
    #[serde(flatten)]
    pub op: Op,
}

/// Operations a step may perform.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Deposit {
        user: Address,
        amount: String,
    },
    ConvertLegacy {
        user: Address,
        amount: String,
    },
    AddReward {
        #[serde(default)]
        caller: Option<Address>,
        amount: String,
    },
    RemoveReward {
        #[serde(default)]
        caller: Option<Address>,
        amount: String,
    },
    /// `amount` is in vouchers.
    WithdrawRequest {
        user: Address,
        amount: String,
    },
    /// `amount` of "0" (the default) claims the maximum available.
    WithdrawComplete {
        user: Address,
        #[serde(default = "zero_amount")]
        amount: String,
    },
    ReceiveLiquidity {
        #[serde(default)]
        from: Option<Address>,
        amount: String,
    },
    VaultReceive {
        payer: Address,
        amount: String,
    },
    VaultDrip {
        #[serde(default)]
        caller: Option<Address>,
    },
    SetFeeRate {
        #[serde(default)]
        caller: Option<Address>,
        rate: String,
    },
    Pause {
        #[serde(default)]
        caller: Option<Address>,
    },
    Unpause {
        #[serde(default)]
        caller: Option<Address>,
    },
    /// Issue legacy tokens to `user`; a fixture, not a protocol operation.
    MintLegacy {
        user: Address,
        amount: String,
    },
}

fn zero_amount() -> String {
    "0".to_string()
}

impl Op {
    /// Name as written in scenario files.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Deposit { .. } => "deposit",
            Op::ConvertLegacy { .. } => "convert_legacy",
            Op::AddReward { .. } => "add_reward",
            Op::RemoveReward { .. } => "remove_reward",
            Op::WithdrawRequest { .. } => "withdraw_request",
            Op::WithdrawComplete { .. } => "withdraw_complete",
            Op::ReceiveLiquidity { .. } => "receive_liquidity",
            Op::VaultReceive { .. } => "vault_receive",
            Op::VaultDrip { .. } => "vault_drip",
            Op::SetFeeRate { .. } => "set_fee_rate",
            Op::Pause { .. } => "pause",
            Op::Unpause { .. } => "unpause",
            Op::MintLegacy { .. } => "mint_legacy",
        }
    }
}

/// Parse scenario text.
pub fn parse(content: &str) -> anyhow::Result<Vec<Step>> {
    let steps: Vec<Step> = serde_json::from_str(content)?;
    Ok(steps)
}

/// Read and parse a scenario file.
pub fn load(path: &Path) -> anyhow::Result<Vec<Step>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse(&content).with_context(|| format!("parsing {}", path.display()))
}

fn amount(text: &str) -> anyhow::Result<Amount> {
    parse_units(text).with_context(|| format!("amount {text:?}"))
}

/// End-of-run snapshot of protocol state, with decimal amounts.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub token_pool: String,
    pub voucher_supply: String,
    pub exchange_rate: String,
    pub ledger_balance: String,
    pub queued_withdrawal: String,
    pub completed_withdrawal: String,
    pub sink_balance: String,
    pub vault_total: String,
    pub vault_paid: String,
}

/// Ledger plus vault, mutated only through [`Protocol::apply`].
#[derive(Debug)]
pub struct Protocol {
    ledger: SimLedger,
    vault: SimVault,
    liquidity_source: Address,
}

impl Protocol {
    /// Build genesis state from config.
    ///
    /// The owner receives the seed voucher mint of `initial_pool`, which the
    /// ledger binds to an equal starting pool.
    pub fn new(config: &SimConfig) -> anyhow::Result<Self> {
        let ledger_cfg = &config.ledger;
        let mut voucher = MemoryToken::new();
        voucher
            .mint(&ledger_cfg.owner, ledger_cfg.initial_pool()?)
            .context("seed voucher mint")?;

        let ledger = ExchangeRateLedger::new(
            LedgerConfig {
                owner: ledger_cfg.owner,
                fee_receiver: ledger_cfg.fee_receiver,
                fee_rate: ledger_cfg.fee_rate()?,
                reward_reporter: ledger_cfg.withdrawal_vault,
            },
            voucher,
            MemoryToken::new(),
            MemorySink::new(ledger_cfg.sink),
        )?;

        let vault_cfg = &config.vault;
        let vault = RewardVestingVault::new(
            VaultConfig {
                address: vault_cfg.address,
                owner: vault_cfg.owner,
                operator: vault_cfg.operator,
                window_days: vault_cfg.window_days,
                min_reward: Amount::from(vault_cfg.min_reward),
            },
            MemorySink::new(ledger_cfg.sink),
            vault_cfg.genesis_time,
        )?;

        Ok(Self {
            ledger,
            vault,
            liquidity_source: ledger_cfg.withdrawal_vault,
        })
    }

    /// The exchange-rate ledger.
    pub fn ledger(&self) -> &SimLedger {
        &self.ledger
    }

    /// The reward vesting vault.
    pub fn vault(&self) -> &SimVault {
        &self.vault
    }

    /// Run one step and return the events it recorded.
    ///
    /// A failing step leaves the protocol untouched.
    pub fn apply(&mut self, step: &Step) -> anyhow::Result<Vec<Event>> {
        let at = step.at;
        match &step.op {
            Op::Deposit { user, amount: a } => {
                self.ledger.deposit(user, amount(a)?)?;
            }
            Op::ConvertLegacy { user, amount: a } => {
                self.ledger.convert_legacy(user, amount(a)?)?;
            }
            Op::AddReward { caller, amount: a } => {
                let caller = caller.unwrap_or(self.ledger.reward_reporter());
                self.ledger.add_reward(&caller, amount(a)?)?;
            }
            Op::RemoveReward { caller, amount: a } => {
                let caller = caller.unwrap_or(self.ledger.reward_reporter());
                self.ledger.remove_reward(&caller, amount(a)?)?;
            }
            Op::WithdrawRequest { user, amount: a } => {
                self.ledger.withdraw_request(user, amount(a)?)?;
            }
            Op::WithdrawComplete { user, amount: a } => {
                self.ledger.withdraw_complete(user, amount(a)?)?;
            }
            Op::ReceiveLiquidity { from, amount: a } => {
                let from = from.unwrap_or(self.liquidity_source);
                self.ledger.receive_liquidity(&from, amount(a)?)?;
            }
            Op::VaultReceive { payer, amount: a } => {
                self.vault.receive_reward(payer, amount(a)?, at)?;
            }
            Op::VaultDrip { caller } => {
                let caller = caller.unwrap_or(self.vault.operator());
                self.vault.drip(&caller, at)?;
            }
            Op::SetFeeRate { caller, rate } => {
                let caller = caller.unwrap_or(self.ledger.owner());
                self.ledger.set_fee_rate(&caller, amount(rate)?)?;
            }
            Op::Pause { caller } => {
                let caller = caller.unwrap_or(self.ledger.owner());
                self.ledger.pause(&caller)?;
            }
            Op::Unpause { caller } => {
                let caller = caller.unwrap_or(self.ledger.owner());
                self.ledger.unpause(&caller)?;
            }
            Op::MintLegacy { user, amount: a } => {
                self.ledger.legacy_mut().mint(user, amount(a)?)?;
            }
        }

        let mut events = self.ledger.drain_events();
        events.extend(self.vault.drain_events());
        Ok(events)
    }

    /// Snapshot for the end-of-run report.
    pub fn summary(&self) -> anyhow::Result<Summary> {
        let sink_balance = self
            .ledger
            .sink()
            .balance()
            .saturating_add(self.vault.sink().balance());
        Ok(Summary {
            token_pool: format_units(self.ledger.token_pool()),
            voucher_supply: format_units(self.ledger.voucher_supply()),
            exchange_rate: format_units(self.ledger.exchange_rate()?),
            ledger_balance: format_units(self.ledger.balance()),
            queued_withdrawal: format_units(self.ledger.queued_withdrawal()),
            completed_withdrawal: format_units(self.ledger.completed_withdrawal()),
            sink_balance: format_units(sink_balance),
            vault_total: format_units(self.vault.reward().total),
            vault_paid: format_units(self.vault.reward().paid),
        })
    }
}
