//! # veth-ledger
//!
//! Exchange-rate ledger and withdrawal queue for the vETH pool.
//!
//! Users deposit base asset and receive vouchers at the current
//! `tokenPool / voucherSupply` rate. Reported rewards and penalties move
//! `tokenPool` and with it the rate for every holder. Redemptions go through
//! a FIFO queue that is derived from two monotonic counters instead of a
//! list, so every operation is O(1).
//!
//! ## Modules
//!
//! - [`ledger`] — the exchange-rate ledger and its operations
//! - [`queue`] — withdrawal records and the counter-based FIFO queue

pub mod ledger;
pub mod queue;

pub use ledger::{ExchangeRateLedger, LedgerConfig};
pub use queue::{WithdrawalQueue, WithdrawalRecord};

use veth_math::{Amount, MathError};
use veth_types::{AccessError, Address, Role, TokenError};

/// Scale of the fee rate: `FEE_RATE_DENOMINATOR` represents 100%.
pub const FEE_RATE_DENOMINATOR: Amount = veth_math::SCALE;

/// Error types for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A positive amount was required.
    #[error("zero amount")]
    ZeroAmount,

    /// User-facing operation attempted while paused.
    #[error("paused")]
    Paused,

    /// Caller lacks the required role.
    #[error("caller {caller} is not the {role}")]
    Unauthorized {
        /// The role that was required.
        role: Role,
        /// The rejected caller.
        caller: Address,
    },

    /// Fee rate above [`FEE_RATE_DENOMINATOR`].
    #[error("fee rate {rate} exceeds range")]
    FeeRateOutOfRange {
        /// The rejected rate.
        rate: Amount,
    },

    /// Completion amount larger than the caller's outstanding claim.
    #[error("exceed permitted amount: requested {requested}, permitted {permitted}")]
    ExceedPermittedAmount {
        /// The amount asked for.
        requested: Amount,
        /// The caller's outstanding claim.
        permitted: Amount,
    },

    /// Liquidity covering the caller's queue position is not there yet.
    #[error("insufficient withdrawal amount: requested {requested}, available {available}")]
    InsufficientWithdrawalAmount {
        /// The amount asked for.
        requested: Amount,
        /// What the caller can claim right now.
        available: Amount,
    },

    /// The operation would drive `tokenPool` below zero.
    #[error("insufficient pool: requested {requested}, pool {pool}")]
    InsufficientPool {
        /// The amount to remove.
        requested: Amount,
        /// The current pool.
        pool: Amount,
    },

    /// A token collaborator rejected the call.
    #[error("token: {0}")]
    Token(#[from] TokenError),

    /// Fixed-point arithmetic failed.
    #[error("math: {0}")]
    Math(#[from] MathError),
}

impl From<AccessError> for LedgerError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Paused => LedgerError::Paused,
            AccessError::Unauthorized { role, caller } => LedgerError::Unauthorized { role, caller },
        }
    }
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
