//! Decimal string conversion for fixed-point amounts.
//!
//! Used by configuration files, scenario fixtures and log output, where
//! `"0.05"` reads better than `50000000000000000`.

use crate::{Amount, MathError, Result, DECIMALS, SCALE};

/// Parse a decimal string such as `"1.005"` into a scaled [`Amount`].
///
/// At most [`DECIMALS`] fractional digits are accepted; extra precision is
/// rejected rather than silently truncated.
///
/// # Errors
///
/// - [`MathError::InvalidDecimal`] for empty input, stray characters or too
///   many fractional digits
/// - [`MathError::Overflow`] if the value does not fit
pub fn parse_units(input: &str) -> Result<Amount> {
    let input = input.trim();
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(MathError::InvalidDecimal(input.to_string()));
    }
    if frac.len() > DECIMALS as usize {
        return Err(MathError::InvalidDecimal(format!(
            "{input}: more than {DECIMALS} fractional digits"
        )));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(MathError::InvalidDecimal(input.to_string()));
    }

    let whole_value: Amount = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<Amount>()
            .map_err(|_| MathError::Overflow)?
    };

    let frac_value: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = DECIMALS as usize);
        padded
            .parse::<Amount>()
            .map_err(|e| MathError::InvalidDecimal(e.to_string()))?
    };

    whole_value
        .checked_mul(SCALE)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or(MathError::Overflow)
}

/// Format a scaled [`Amount`] as a decimal string with trailing zeros trimmed.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / SCALE;
    let frac = amount % SCALE;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:0>width$}", width = DECIMALS as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
