//! # veth-math
//!
//! 18-decimal fixed-point arithmetic for the vETH accounting core.
//!
//! Every amount in the protocol is a non-negative integer scaled by
//! [`SCALE`] (1e18). Ratio math multiplies before it divides and always
//! floors, so rounding dust stays in the pool.
//!
//! ## Modules
//!
//! - [`fixed`] — floor `mul_div` and checked add/sub helpers
//! - [`units`] — decimal string parsing and formatting

pub mod fixed;
pub mod units;

/// A fixed-point amount scaled by [`SCALE`].
pub type Amount = u128;

/// Number of decimals carried by every [`Amount`].
pub const DECIMALS: u32 = 18;

/// One whole unit (1.0) in fixed-point representation.
pub const SCALE: Amount = 1_000_000_000_000_000_000;

/// Error types for fixed-point operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    /// Result does not fit in an [`Amount`].
    #[error("arithmetic overflow")]
    Overflow,

    /// Subtraction would go below zero.
    #[error("arithmetic underflow")]
    Underflow,

    /// Denominator is zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Decimal string could not be parsed.
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),
}

/// Convenience result type for fixed-point operations.
pub type Result<T> = std::result::Result<T, MathError>;
