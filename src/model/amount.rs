use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("not a decimal number")]
    NotANumber,

    #[error("amount must not be negative")]
    Negative,

    #[error("at most {decimals} decimal places are allowed")]
    TooPrecise { decimals: u32 },

    #[error("amount is too large")]
    Overflow,
}

/// Parse a user-entered decimal string (e.g. `"10"`, `"12.5"`).
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    // Plain decimal notation only; `Decimal::from_str` would take "1e3".
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(AmountError::NotANumber);
    }
    let amount = Decimal::from_str(trimmed).map_err(|_| AmountError::NotANumber)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative);
    }
    Ok(amount)
}

/// Render `value` with exactly `places` decimals, rounding half away from
/// zero.
pub fn format_fixed(value: Decimal, places: u32) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", places as usize, rounded)
}

/// Convert a human amount into integer token units with `decimals` places.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<U256, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative);
    }
    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > decimals {
        return Err(AmountError::TooPrecise { decimals });
    }
    let mantissa = u128::try_from(normalized.mantissa()).map_err(|_| AmountError::Negative)?;
    let factor = U256::from(10u64).pow(U256::from(decimals - scale));
    U256::from(mantissa)
        .checked_mul(factor)
        .ok_or(AmountError::Overflow)
}

/// Convert integer token units into a decimal amount.
///
/// `Decimal` holds a 96-bit mantissa; values that do not fit lose their
/// least significant fractional digits (truncated, never rounded up).
pub fn from_base_units(raw: U256, decimals: u32) -> Decimal {
    let limit = U256::from(1u128 << 96);
    let ten = U256::from(10u64);
    let mut value = raw;
    let mut scale = decimals;
    while value >= limit && scale > 0 {
        value /= ten;
        scale -= 1;
    }
    if value >= limit {
        return Decimal::MAX;
    }
    Decimal::from_i128_with_scale(value.to::<u128>() as i128, scale)
}
