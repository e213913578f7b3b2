//! Simulator configuration file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use veth_math::{units::parse_units, Amount};
use veth_types::{Address, Timestamp};
use veth_vesting::{MIN_REWARD_AMOUNT, REWARD_DURATION_DAYS};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "VETH_CONFIG";

/// Config file used when neither `--config` nor the env var is given.
pub const DEFAULT_CONFIG_FILE: &str = "veth.toml";

/// Complete simulator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Exchange-rate ledger settings.
    #[serde(default)]
    pub ledger: LedgerSection,
    /// Vesting vault settings.
    #[serde(default)]
    pub vault: VaultSection,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSection {
    /// Administrator; also receives the genesis voucher mint.
    #[serde(default = "default_owner")]
    pub owner: Address,
    /// Recipient of fee vouchers.
    #[serde(default = "default_fee_receiver")]
    pub fee_receiver: Address,
    /// Fee share of each reward as a decimal, "0.1" = 10%.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: String,
    /// Genesis voucher supply and pool value, as a decimal.
    #[serde(default = "default_initial_pool")]
    pub initial_pool: String,
    /// Reward reporter identity.
    #[serde(default = "default_withdrawal_vault")]
    pub withdrawal_vault: Address,
    /// Where deposits and drips are forwarded.
    #[serde(default = "default_sink")]
    pub sink: Address,
}

/// Vault configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    /// The vault's own identity.
    #[serde(default = "default_vault_address")]
    pub address: Address,
    #[serde(default = "default_owner")]
    pub owner: Address,
    /// The only caller allowed to drip.
    #[serde(default = "default_operator")]
    pub operator: Address,
    #[serde(default = "default_window_days")]
    pub window_days: u64,
    /// Dust floor in base units (not decimal).
    #[serde(default = "default_min_reward")]
    pub min_reward: u64,
    /// Unix seconds the vault schedule is anchored at.
    #[serde(default)]
    pub genesis_time: Timestamp,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default filter directive: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_owner() -> Address {
    Address::repeat_byte(0x01)
}

fn default_fee_receiver() -> Address {
    Address::repeat_byte(0x0f)
}

fn default_fee_rate() -> String {
    "0.1".to_string()
}

fn default_initial_pool() -> String {
    "1".to_string()
}

fn default_withdrawal_vault() -> Address {
    Address::repeat_byte(0x0e)
}

fn default_sink() -> Address {
    Address::repeat_byte(0x0d)
}

fn default_vault_address() -> Address {
    Address::repeat_byte(0x0c)
}

fn default_operator() -> Address {
    Address::repeat_byte(0x02)
}

fn default_window_days() -> u64 {
    REWARD_DURATION_DAYS
}

fn default_min_reward() -> u64 {
    MIN_REWARD_AMOUNT as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            fee_receiver: default_fee_receiver(),
            fee_rate: default_fee_rate(),
            initial_pool: default_initial_pool(),
            withdrawal_vault: default_withdrawal_vault(),
            sink: default_sink(),
        }
    }
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            address: default_vault_address(),
            owner: default_owner(),
            operator: default_operator(),
            window_days: default_window_days(),
            min_reward: default_min_reward(),
            genesis_time: 0,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LedgerSection {
    /// Fee rate scaled by 1e18.
    pub fn fee_rate(&self) -> anyhow::Result<Amount> {
        parse_units(&self.fee_rate).with_context(|| format!("ledger.fee_rate {:?}", self.fee_rate))
    }

    /// Genesis pool scaled by 1e18.
    pub fn initial_pool(&self) -> anyhow::Result<Amount> {
        parse_units(&self.initial_pool)
            .with_context(|| format!("ledger.initial_pool {:?}", self.initial_pool))
    }
}

impl SimConfig {
    /// Load configuration from `path`, else from `$VETH_CONFIG`, else from
    /// `./veth.toml`.
    ///
    /// An explicitly named file must exist. The implicit default falls back
    /// to built-in defaults when absent.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var(CONFIG_ENV) {
                Ok(p) => (PathBuf::from(p), true),
                Err(_) => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        if !explicit && !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", config_path.display()))
    }

    /// Parse TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.ledger.fee_rate()?;
        config.ledger.initial_pool()?;
        Ok(config)
    }
}
