//! Floor-rounded fixed-point helpers.
//!
//! ## Formula
//!
//! ```text
//! mul_div(a, b, d) = floor(a * b / d)
//! ```
//!
//! The product is formed in 256 bits, so `a * b` never overflows even when
//! both operands are close to `u128::MAX`. Only the final quotient must fit
//! in an [`Amount`].

use primitive_types::U256;

use crate::{Amount, MathError, Result};

/// Compute `floor(a * b / denominator)` with a 256-bit intermediate.
///
/// # Errors
///
/// - [`MathError::DivisionByZero`] if `denominator` is zero
/// - [`MathError::Overflow`] if the quotient exceeds `u128::MAX`
pub fn mul_div(a: Amount, b: Amount, denominator: Amount) -> Result<Amount> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }

    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(MathError::Overflow)?;
    let quotient = product / U256::from(denominator);

    if quotient > U256::from(u128::MAX) {
        return Err(MathError::Overflow);
    }

    tracing::trace!(a, b, denominator, "mul_div");
    Ok(quotient.low_u128())
}

/// Checked addition.
pub fn add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

/// Checked subtraction.
pub fn sub(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SCALE;
    use proptest::prelude::*;

    #[test]
    fn test_mul_div_floors() {
        // 1.1 / 1.005 = 1.094527363184079601990...
        let v = mul_div(SCALE, 1_100_000_000_000_000_000, 1_005_000_000_000_000_000)
            .expect("mul_div");
        assert_eq!(v, 1_094_527_363_184_079_601);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // a * b overflows u128 but the quotient fits
        let a = u128::MAX / 2;
        let v = mul_div(a, 4, 4).expect("wide product");
        assert_eq!(v, a);
    }

    #[test]
    fn test_mul_div_quotient_overflow() {
        let err = mul_div(u128::MAX, 2, 1).expect_err("overflow");
        assert_eq!(err, MathError::Overflow);
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        let err = mul_div(1, 1, 0).expect_err("div by zero");
        assert_eq!(err, MathError::DivisionByZero);
    }

    #[test]
    fn test_add_sub_checked() {
        assert_eq!(add(u128::MAX, 1), Err(MathError::Overflow));
        assert_eq!(sub(0, 1), Err(MathError::Underflow));
        assert_eq!(sub(5, 3), Ok(2));
    }

    proptest! {
        #[test]
        fn prop_mul_div_never_rounds_up(a in 0u128..=u64::MAX as u128, b in 0u128..=u64::MAX as u128, d in 1u128..=u64::MAX as u128) {
            let q = mul_div(a, b, d).expect("fits");
            // q * d <= a * b < (q + 1) * d
            prop_assert!(q * d <= a * b);
            prop_assert!(a * b < (q + 1) * d);
        }
    }
}
