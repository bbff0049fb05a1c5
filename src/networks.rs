//! Withdrawal network configuration.
//!
//! Per coin/network settings: minimum withdrawal, flat fee, and the
//! custodial hot-wallet address whose on-chain balance funds the sends.
//! The fee is always taken from this configuration, never from the request.

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settings for withdrawing one coin over one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Coin symbol, e.g. "USDT"
    pub coin: String,
    /// Network name, e.g. "TRC20"
    pub network: String,
    pub minimum_withdraw: Decimal,
    pub withdraw_fee: Decimal,
    /// Custodial source address for outbound sends
    pub hot_wallet_address: String,
}

/// Lookup table keyed by uppercased `(coin, network)`.
#[derive(Debug, Default)]
pub struct NetworkTable {
    networks: DashMap<(String, String), NetworkConfig>,
}

impl NetworkTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(coin: &str, network: &str) -> (String, String) {
        (
            coin.trim().to_ascii_uppercase(),
            network.trim().to_ascii_uppercase(),
        )
    }

    pub fn get(&self, coin: &str, network: &str) -> Option<NetworkConfig> {
        self.networks
            .get(&Self::key(coin, network))
            .map(|c| c.clone())
    }

    pub fn upsert(&self, config: NetworkConfig) {
        self.networks
            .insert(Self::key(&config.coin, &config.network), config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usdt_trc20() -> NetworkConfig {
        NetworkConfig {
            coin: "USDT".into(),
            network: "TRC20".into(),
            minimum_withdraw: dec!(5),
            withdraw_fee: dec!(1),
            hot_wallet_address: "THotWallet111".into(),
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = NetworkTable::new();
        table.upsert(usdt_trc20());

        assert!(table.get("usdt", "trc20").is_some());
        assert!(table.get(" USDT ", "Trc20").is_some());
        assert!(table.get("USDT", "ERC20").is_none());
    }

    #[test]
    fn test_upsert_replaces() {
        let table = NetworkTable::new();
        table.upsert(usdt_trc20());
        let mut updated = usdt_trc20();
        updated.withdraw_fee = dec!(2);
        table.upsert(updated);

        assert_eq!(table.get("USDT", "TRC20").unwrap().withdraw_fee, dec!(2));
    }
}
