//! Per-user wallet: one [`AssetBalance`] slot per supported asset.
//!
//! # Data Structure
//! Uses a fixed array indexed by `Asset::index()`. The asset set is closed,
//! so O(1) direct indexing needs no hashing and no resizing.

use serde::{Deserialize, Serialize};

use crate::balance::AssetBalance;
use crate::core_types::{ASSET_COUNT, Asset, UserId};

/// A user's wallet across all supported assets.
///
/// Created lazily the first time a user is referenced by any ledger
/// operation; never deleted. Mutable access exists only inside
/// [`crate::ledger::LedgerStore`], which holds the per-user entry guard for
/// the duration of each mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    user_id: UserId,
    assets: [AssetBalance; ASSET_COUNT],
    /// Millis timestamp of the last settled transfer, if any
    last_transaction: Option<i64>,
}

impl Wallet {
    /// Create an all-zero wallet for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            assets: [AssetBalance::default(); ASSET_COUNT],
            last_transaction: None,
        }
    }

    #[inline(always)]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Read-only balance slot for an asset.
    #[inline(always)]
    pub fn asset(&self, asset: Asset) -> &AssetBalance {
        &self.assets[asset.index()]
    }

    /// Mutable balance slot. Crate-private: only the ledger store mutates.
    #[inline(always)]
    pub(crate) fn asset_mut(&mut self, asset: Asset) -> &mut AssetBalance {
        &mut self.assets[asset.index()]
    }

    /// Spendable amount for an asset (`balance - locked`).
    #[inline(always)]
    pub fn available(&self, asset: Asset) -> u64 {
        self.asset(asset).available()
    }

    pub fn last_transaction(&self) -> Option<i64> {
        self.last_transaction
    }

    pub(crate) fn touch(&mut self, at_millis: i64) {
        self.last_transaction = Some(at_millis);
    }

    /// All slots satisfy `locked <= balance`.
    pub fn is_consistent(&self) -> bool {
        self.assets.iter().all(AssetBalance::is_consistent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wallet_is_zeroed() {
        let wallet = Wallet::new(42);
        assert_eq!(wallet.user_id(), 42);
        for asset in Asset::ALL {
            assert_eq!(wallet.asset(asset).balance(), 0);
            assert_eq!(wallet.available(asset), 0);
        }
        assert!(wallet.last_transaction().is_none());
        assert!(wallet.is_consistent());
    }

    #[test]
    fn test_slots_are_independent() {
        let mut wallet = Wallet::new(1);
        wallet.asset_mut(Asset::Usdt).credit(1_000_000).unwrap();
        assert_eq!(wallet.available(Asset::Usdt), 1_000_000);
        assert_eq!(wallet.available(Asset::Xp), 0);
        assert_eq!(wallet.available(Asset::Spin), 0);
    }
}
