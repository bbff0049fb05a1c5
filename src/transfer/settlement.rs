//! Settlement client interface.
//!
//! Performs the actual value movement outside the ledger (the on-chain
//! send for withdrawals). Implemented elsewhere; the engine only depends
//! on this contract. Calls happen strictly after funds are locked and
//! never while any ledger guard is held.

use async_trait::async_trait;
use rand::RngCore;
use thiserror::Error;

use crate::core_types::Asset;

/// Errors surfaced by a settlement backend.
#[derive(Debug, Error, Clone)]
pub enum SettlementError {
    #[error("Settlement rejected: {0}")]
    Rejected(String),

    #[error("Settlement backend unavailable: {0}")]
    Unavailable(String),
}

/// External settlement backend (custodial hot wallet + chain access).
#[async_trait]
pub trait SettlementClient: Send + Sync {
    /// On-chain balance of an address on a network, in the asset's minor
    /// units.
    async fn external_balance(&self, network: &str, address: &str)
    -> Result<u64, SettlementError>;

    /// Send `amount` (minor units) to `to_address` on `network`.
    /// Returns the settlement transaction hash.
    async fn send(
        &self,
        network: &str,
        asset: Asset,
        to_address: &str,
        amount: u64,
    ) -> Result<String, SettlementError>;
}

/// Hash-shaped synthetic settlement reference for transfers that never
/// touch a chain (swaps). Presentation concern only: gives the UI one
/// reference format across all transfer kinds.
pub fn synthetic_reference() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}

/// Mock settlement backend for tests.
#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use super::*;

    pub struct MockSettlementClient {
        hot_balance: AtomicU64,
        fail_send: Mutex<Option<String>>,
        send_count: AtomicUsize,
        balance_count: AtomicUsize,
    }

    impl MockSettlementClient {
        pub fn new(hot_balance: u64) -> Self {
            Self {
                hot_balance: AtomicU64::new(hot_balance),
                fail_send: Mutex::new(None),
                send_count: AtomicUsize::new(0),
                balance_count: AtomicUsize::new(0),
            }
        }

        pub fn set_hot_balance(&self, balance: u64) {
            self.hot_balance.store(balance, Ordering::SeqCst);
        }

        pub fn set_fail_send(&self, reason: Option<&str>) {
            *self.fail_send.lock().unwrap() = reason.map(str::to_string);
        }

        pub fn send_count(&self) -> usize {
            self.send_count.load(Ordering::SeqCst)
        }

        pub fn balance_count(&self) -> usize {
            self.balance_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SettlementClient for MockSettlementClient {
        async fn external_balance(
            &self,
            _network: &str,
            _address: &str,
        ) -> Result<u64, SettlementError> {
            self.balance_count.fetch_add(1, Ordering::SeqCst);
            Ok(self.hot_balance.load(Ordering::SeqCst))
        }

        async fn send(
            &self,
            _network: &str,
            _asset: Asset,
            _to_address: &str,
            _amount: u64,
        ) -> Result<String, SettlementError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if let Some(reason) = self.fail_send.lock().unwrap().clone() {
                return Err(SettlementError::Rejected(reason));
            }
            Ok(synthetic_reference())
        }
    }
}

#[cfg(test)]
pub use mock::MockSettlementClient;
