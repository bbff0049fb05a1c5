//! Application configuration, loaded from YAML.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::networks::{NetworkConfig, NetworkTable};
use crate::rates::{Rate, RateTable};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    /// Seeded conversion rates; live updates go through `RateTable::upsert`
    #[serde(default)]
    pub rates: Vec<Rate>,
    /// Withdrawal network configurations
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "rewards-ledger.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            enable_tracing: true,
            rates: Vec::new(),
            networks: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Build the rate table from the seeded rates.
    pub fn rate_table(&self) -> RateTable {
        let table = RateTable::new();
        for rate in &self.rates {
            table.upsert(rate.clone());
        }
        table
    }

    /// Build the network table from the seeded configurations.
    pub fn network_table(&self) -> NetworkTable {
        let table = NetworkTable::new();
        for network in &self.networks {
            table.upsert(network.clone());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Asset;

    const SAMPLE: &str = r#"
log_level: info
log_dir: ./logs
log_file: rewards-ledger.log
use_json: false
rotation: daily
enable_tracing: true
rates:
  - from: usdt
    to: xp
    rate: "10000"
    fee_percent: "2"
    min_amount: "0.1"
    max_amount: "10000"
    is_active: true
networks:
  - coin: USDT
    network: TRC20
    minimum_withdraw: "5"
    withdraw_fee: "1"
    hot_wallet_address: THotWallet111
"#;

    #[test]
    fn test_parse_sample_config() {
        let config: AppConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.rates.len(), 1);
        assert_eq!(config.networks.len(), 1);

        let rates = config.rate_table();
        let rate = rates.get_active_rate(Asset::Usdt, Asset::Xp).unwrap();
        assert_eq!(rate.fee_percent.to_string(), "2");

        let networks = config.network_table();
        assert!(networks.get("usdt", "trc20").is_some());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(config.rates.is_empty());
    }
}
