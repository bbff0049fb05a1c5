//! Money conversion between the client-facing `Decimal` representation and
//! the internal scaled `u64` representation.
//!
//! All amounts inside the ledger are unsigned integers in minor units
//! (`10^decimals` per asset, see [`crate::core_types::Asset::decimals`]).
//! Floating point never touches balance math; `Decimal` is used only at the
//! API boundary and for rate arithmetic.
//!
//! Conversions reject rather than truncate: an amount with more precision
//! than the asset supports is an input error, not something to round away.

use rust_decimal::prelude::*;
use thiserror::Error;

/// Money conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),
}

/// Convert a validated `Decimal` into scaled `u64` minor units.
///
/// # Errors
/// * `InvalidAmount` - zero or negative input
/// * `PrecisionOverflow` - more fractional digits than the asset carries
/// * `Overflow` - result does not fit in `u64`
pub fn parse_decimal(amount: Decimal, decimals: u32) -> Result<u64, MoneyError> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(MoneyError::InvalidAmount);
    }

    let normalized = amount.normalize();
    if normalized.scale() > decimals {
        return Err(MoneyError::PrecisionOverflow {
            provided: normalized.scale(),
            max: decimals,
        });
    }

    let multiplier = Decimal::from(10u64.pow(decimals));
    let scaled = normalized
        .checked_mul(multiplier)
        .ok_or(MoneyError::Overflow)?;

    scaled.to_u64().ok_or(MoneyError::Overflow)
}

/// Convert a client string amount into scaled `u64` minor units.
pub fn parse_amount(amount_str: &str, decimals: u32) -> Result<u64, MoneyError> {
    let trimmed = amount_str.trim();
    if trimmed.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }
    let decimal = Decimal::from_str(trimmed)
        .map_err(|e| MoneyError::InvalidFormat(format!("{trimmed}: {e}")))?;
    parse_decimal(decimal, decimals)
}

/// Convert a computed (derived) `Decimal` into minor units, truncating
/// excess precision toward zero.
///
/// For client input use [`parse_decimal`], which rejects excess precision.
/// Derived values - fees, conversion outputs - may legitimately carry more
/// digits than the target asset, and the ledger never credits or charges
/// the rounded-away fraction. Zero is allowed here.
pub fn to_scaled_floor(amount: Decimal, decimals: u32) -> Result<u64, MoneyError> {
    if amount.is_sign_negative() {
        return Err(MoneyError::InvalidAmount);
    }
    let multiplier = Decimal::from(10u64.pow(decimals));
    let scaled = amount
        .checked_mul(multiplier)
        .ok_or(MoneyError::Overflow)?
        .trunc();
    scaled.to_u64().ok_or(MoneyError::Overflow)
}

/// Convert scaled minor units back into a `Decimal` for display/transport.
pub fn to_decimal(amount: u64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(amount as i128, decimals)
}

/// Format scaled minor units as a trimmed decimal string.
pub fn format_amount(amount: u64, decimals: u32) -> String {
    to_decimal(amount, decimals).normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_basic() {
        assert_eq!(parse_amount("1.5", 6).unwrap(), 1_500_000);
        assert_eq!(parse_amount("10", 6).unwrap(), 10_000_000);
        assert_eq!(parse_amount("0.000001", 6).unwrap(), 1);
        assert_eq!(parse_amount("98000", 0).unwrap(), 98_000);
    }

    #[test]
    fn test_parse_amount_rejects_precision_overflow() {
        let err = parse_amount("0.0000001", 6).unwrap_err();
        assert!(matches!(err, MoneyError::PrecisionOverflow { .. }));

        // Trailing zeros are not extra precision
        assert_eq!(parse_amount("1.5000000", 6).unwrap(), 1_500_000);

        let err = parse_amount("1.5", 0).unwrap_err();
        assert!(matches!(
            err,
            MoneyError::PrecisionOverflow { provided: 1, max: 0 }
        ));
    }

    #[test]
    fn test_parse_amount_rejects_nonpositive() {
        assert_eq!(parse_amount("0", 6).unwrap_err(), MoneyError::InvalidAmount);
        assert_eq!(
            parse_amount("-1", 6).unwrap_err(),
            MoneyError::InvalidAmount
        );
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(
            parse_amount("", 6).unwrap_err(),
            MoneyError::InvalidFormat(_)
        ));
        assert!(matches!(
            parse_amount("1.2.3", 6).unwrap_err(),
            MoneyError::InvalidFormat(_)
        ));
        assert!(matches!(
            parse_amount("abc", 6).unwrap_err(),
            MoneyError::InvalidFormat(_)
        ));
    }

    #[test]
    fn test_to_scaled_floor_truncates() {
        use rust_decimal::Decimal;
        use std::str::FromStr;

        let d = Decimal::from_str("0.1234567").unwrap();
        assert_eq!(to_scaled_floor(d, 6).unwrap(), 123_456);
        assert_eq!(to_scaled_floor(Decimal::ZERO, 6).unwrap(), 0);
        assert_eq!(
            to_scaled_floor(Decimal::from_str("-1").unwrap(), 6).unwrap_err(),
            MoneyError::InvalidAmount
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_500_000, 6), "1.5");
        assert_eq!(format_amount(98_000, 0), "98000");
        assert_eq!(format_amount(0, 6), "0");
    }

    #[test]
    fn test_decimal_roundtrip() {
        let scaled = parse_amount("123.456789", 6).unwrap();
        assert_eq!(to_decimal(scaled, 6).normalize().to_string(), "123.456789");
    }
}
