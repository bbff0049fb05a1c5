//! Rate source: active conversion rates per asset pair.
//!
//! Read-only from the engine's perspective; the external configuration
//! collaborator maintains entries through `upsert`/`remove`.

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::Asset;
use crate::error::EngineError;

/// Conversion rate for one `(from, to)` asset pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rate {
    pub from: Asset,
    pub to: Asset,
    /// Output units per net input unit, must be > 0
    pub rate: Decimal,
    /// Fee percentage in [0, 100], charged on the input amount
    pub fee_percent: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub is_active: bool,
}

/// Fee/net/output breakdown for a quoted conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionQuote {
    /// Fee in input-asset units
    pub fee: Decimal,
    /// Input amount net of fee
    pub net: Decimal,
    /// Credited amount in output-asset units
    pub output: Decimal,
}

/// In-memory table of conversion rates, one entry per ordered pair.
#[derive(Debug, Default)]
pub struct RateTable {
    rates: DashMap<(Asset, Asset), Rate>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active rate for a pair, if configured. Inactive entries are
    /// indistinguishable from missing ones to callers.
    pub fn get_active_rate(&self, from: Asset, to: Asset) -> Option<Rate> {
        self.rates
            .get(&(from, to))
            .filter(|r| r.is_active)
            .map(|r| r.clone())
    }

    /// Insert or replace the rate for its pair (configuration side).
    pub fn upsert(&self, rate: Rate) {
        self.rates.insert((rate.from, rate.to), rate);
    }

    /// Remove the rate for a pair (configuration side).
    pub fn remove(&self, from: Asset, to: Asset) {
        self.rates.remove(&(from, to));
    }
}

/// Quote a conversion against a rate.
///
/// # Errors
/// - `AmountTooSmall` / `AmountTooLarge` outside `[min_amount, max_amount]`
pub fn compute_conversion(rate: &Rate, amount: Decimal) -> Result<ConversionQuote, EngineError> {
    if amount < rate.min_amount {
        return Err(EngineError::AmountTooSmall {
            min: rate.min_amount,
        });
    }
    if amount > rate.max_amount {
        return Err(EngineError::AmountTooLarge {
            max: rate.max_amount,
        });
    }

    let fee = amount * rate.fee_percent / Decimal::ONE_HUNDRED;
    let net = amount - fee;
    let output = net * rate.rate;

    Ok(ConversionQuote { fee, net, output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usdt_to_xp() -> Rate {
        Rate {
            from: Asset::Usdt,
            to: Asset::Xp,
            rate: dec!(10000),
            fee_percent: dec!(2),
            min_amount: dec!(0.1),
            max_amount: dec!(10000),
            is_active: true,
        }
    }

    #[test]
    fn test_quote_math() {
        // 10 USDT at rate 10000, 2% fee: fee 0.2, net 9.8, output 98000 XP
        let quote = compute_conversion(&usdt_to_xp(), dec!(10)).unwrap();
        assert_eq!(quote.fee, dec!(0.2));
        assert_eq!(quote.net, dec!(9.8));
        assert_eq!(quote.output, dec!(98000));
    }

    #[test]
    fn test_quote_zero_fee() {
        let mut rate = usdt_to_xp();
        rate.fee_percent = Decimal::ZERO;
        let quote = compute_conversion(&rate, dec!(10)).unwrap();
        assert_eq!(quote.fee, Decimal::ZERO);
        assert_eq!(quote.output, dec!(100000));
    }

    #[test]
    fn test_quote_range_checks() {
        let rate = usdt_to_xp();
        assert!(matches!(
            compute_conversion(&rate, dec!(0.05)),
            Err(EngineError::AmountTooSmall { .. })
        ));
        assert!(matches!(
            compute_conversion(&rate, dec!(10001)),
            Err(EngineError::AmountTooLarge { .. })
        ));
        // Boundaries are inclusive
        assert!(compute_conversion(&rate, dec!(0.1)).is_ok());
        assert!(compute_conversion(&rate, dec!(10000)).is_ok());
    }

    #[test]
    fn test_inactive_rate_is_invisible() {
        let table = RateTable::new();
        let mut rate = usdt_to_xp();
        rate.is_active = false;
        table.upsert(rate);

        assert!(table.get_active_rate(Asset::Usdt, Asset::Xp).is_none());
        // Reverse pair was never configured
        assert!(table.get_active_rate(Asset::Xp, Asset::Usdt).is_none());
    }

    #[test]
    fn test_upsert_replaces_pair() {
        let table = RateTable::new();
        table.upsert(usdt_to_xp());
        let mut updated = usdt_to_xp();
        updated.rate = dec!(12000);
        table.upsert(updated);

        let rate = table.get_active_rate(Asset::Usdt, Asset::Xp).unwrap();
        assert_eq!(rate.rate, dec!(12000));

        table.remove(Asset::Usdt, Asset::Xp);
        assert!(table.get_active_rate(Asset::Usdt, Asset::Xp).is_none());
    }
}
