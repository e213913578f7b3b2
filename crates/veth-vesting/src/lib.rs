//! # veth-vesting
//!
//! Reward vesting vault for the vETH pool.
//!
//! Lump rewards (MEV, tips) arrive at irregular times and sizes. The vault
//! spreads each lump, blended with whatever is still unvested, linearly over
//! a fixed window and lets an operator forward the vested part to the
//! liquidity sink at most once per day bucket.
//!
//! ## Modules
//!
//! - [`schedule`] — the per-day vesting schedule and its settlement math
//! - [`vault`] — the vault: reward intake, operator drip, administration

pub mod schedule;
pub mod vault;

pub use schedule::RewardSchedule;
pub use vault::{RewardVestingVault, VaultConfig};

use veth_math::{Amount, MathError};
use veth_types::{AccessError, Address, Role};

/// Length of the vesting window in days.
pub const REWARD_DURATION_DAYS: u64 = 30;

/// Length of the vesting window in seconds.
pub const WINDOW_SECONDS: u64 = REWARD_DURATION_DAYS * veth_types::time::DAY_SECONDS;

/// Smallest reward lump the vault accepts, in base units.
pub const MIN_REWARD_AMOUNT: Amount = 30;

/// Error types for vesting vault operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VestingError {
    /// Reward lump below the dust floor.
    #[error("reward amount is too low: {amount} < {minimum}")]
    RewardTooLow {
        /// The rejected amount.
        amount: Amount,
        /// The configured floor.
        minimum: Amount,
    },

    /// A drip already happened in this day bucket.
    #[error("paid today (day {day})")]
    PaidToday {
        /// Index of the day bucket.
        day: u64,
    },

    /// Drip attempted by someone other than the operator.
    #[error("caller is not operator")]
    CallerNotOperator,

    /// Caller lacks the required role for an administrative call.
    #[error("caller {caller} is not the {role}")]
    Unauthorized {
        /// The role that was required.
        role: Role,
        /// The rejected caller.
        caller: Address,
    },

    /// Administrative call attempted while the access gate is paused.
    #[error("paused")]
    Paused,

    /// Vault configuration rejected at construction.
    #[error("invalid vault config: {0}")]
    InvalidConfig(String),

    /// Fixed-point arithmetic failed.
    #[error("math: {0}")]
    Math(#[from] MathError),
}

impl VestingError {
    /// Translate an access-gate rejection; the operator role has its own
    /// variant.
    pub(crate) fn from_access(err: AccessError) -> Self {
        match err {
            AccessError::Unauthorized {
                role: Role::Operator,
                ..
            } => VestingError::CallerNotOperator,
            AccessError::Unauthorized { role, caller } => VestingError::Unauthorized { role, caller },
            AccessError::Paused => VestingError::Paused,
        }
    }
}

/// Convenience result type for vesting operations.
pub type Result<T> = std::result::Result<T, VestingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_constants() {
        assert_eq!(REWARD_DURATION_DAYS, 30);
        assert_eq!(WINDOW_SECONDS, 2_592_000);
    }

    #[test]
    fn test_operator_rejection_maps_to_dedicated_variant() {
        let err = VestingError::from_access(AccessError::Unauthorized {
            role: Role::Operator,
            caller: Address::ZERO,
        });
        assert_eq!(err, VestingError::CallerNotOperator);

        let err = VestingError::from_access(AccessError::Unauthorized {
            role: Role::Owner,
            caller: Address::ZERO,
        });
        assert!(matches!(err, VestingError::Unauthorized { role: Role::Owner, .. }));

        assert_eq!(VestingError::from_access(AccessError::Paused), VestingError::Paused);
    }
}
