//! Ledger store: the only component permitted to mutate wallet balances.
//!
//! # Mutual exclusion discipline
//!
//! Wallets live in a `DashMap`. Every mutation runs entirely under the
//! dashmap entry guard for the one affected user, making the check and the
//! write a single atomic operation per wallet. Two requests racing to lock
//! the same funds serialize on that guard, so a read-then-write overdraw
//! window cannot exist. Operations on different users never contend beyond
//! the map shard.
//!
//! No method awaits: long-latency settlement calls happen in the
//! orchestrator, after `lock_funds` returned and with no guard held.

use dashmap::DashMap;
use tracing::{debug, error};

use crate::balance::AssetBalance;
use crate::core_types::{Asset, UserId, now_millis};
use crate::error::EngineError;
use crate::wallet::Wallet;

/// Where a settlement debit takes its funds from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundsSource {
    /// Single-step settlement, no prior reservation (conversion)
    Available,
    /// Debit a prior `lock_funds` reservation (swap)
    Locked,
}

/// In-memory multi-asset ledger.
///
/// Wallets are created lazily on first reference and never deleted.
#[derive(Debug, Default)]
pub struct LedgerStore {
    wallets: DashMap<UserId, Wallet>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a user's wallet, creating it (all-zero) if absent.
    /// Idempotent, no error condition.
    pub fn get_or_create_wallet(&self, user_id: UserId) -> Wallet {
        self.wallets
            .entry(user_id)
            .or_insert_with(|| Wallet::new(user_id))
            .clone()
    }

    /// Snapshot without creating. `None` only for never-referenced users.
    pub fn wallet(&self, user_id: UserId) -> Option<Wallet> {
        self.wallets.get(&user_id).map(|w| w.clone())
    }

    /// Spendable amount for one asset (0 for unknown users).
    pub fn available(&self, user_id: UserId, asset: Asset) -> u64 {
        self.wallets
            .get(&user_id)
            .map(|w| w.available(asset))
            .unwrap_or(0)
    }

    /// Flat credit: the earn/deposit primitive the reward-issuance layer
    /// calls. Increments `balance` and `total_earned`.
    pub fn credit(&self, user_id: UserId, asset: Asset, amount: u64) -> Result<(), EngineError> {
        let mut wallet = self
            .wallets
            .entry(user_id)
            .or_insert_with(|| Wallet::new(user_id));
        wallet
            .asset_mut(asset)
            .credit(amount)
            .map_err(|e| internal(user_id, asset, "credit", e))?;
        debug!(user_id, asset = %asset, amount, "Ledger credit");
        Ok(())
    }

    /// Reserve funds for an in-flight transfer.
    ///
    /// Atomic check-and-increment: succeeds only if `available >= amount`,
    /// otherwise `InsufficientFunds` with the wallet untouched.
    pub fn lock_funds(
        &self,
        user_id: UserId,
        asset: Asset,
        amount: u64,
    ) -> Result<(), EngineError> {
        let mut wallet = self
            .wallets
            .entry(user_id)
            .or_insert_with(|| Wallet::new(user_id));
        wallet
            .asset_mut(asset)
            .lock(amount)
            .map_err(|_| EngineError::InsufficientFunds)?;
        debug!(user_id, asset = %asset, amount, "Funds locked");
        Ok(())
    }

    /// Release a reservation (compensating action).
    ///
    /// Floors at zero; safe to call repeatedly for the same reservation.
    /// Unknown users are a no-op.
    pub fn unlock_funds(&self, user_id: UserId, asset: Asset, amount: u64) {
        if let Some(mut wallet) = self.wallets.get_mut(&user_id) {
            wallet.asset_mut(asset).unlock(amount);
            debug!(user_id, asset = %asset, amount, "Funds unlocked");
        }
    }

    /// Settle an intra-ledger exchange: debit `from_amount` of `from_asset`
    /// and credit `to_amount` of `to_asset`, atomically within the wallet.
    ///
    /// `source` selects whether the debit consumes a prior reservation
    /// (swap) or spends directly from available (one-step conversion).
    /// Both legs are validated before either is applied.
    pub fn settle_transfer(
        &self,
        user_id: UserId,
        from_asset: Asset,
        to_asset: Asset,
        from_amount: u64,
        to_amount: u64,
        source: FundsSource,
    ) -> Result<(), EngineError> {
        let mut wallet = self
            .wallets
            .entry(user_id)
            .or_insert_with(|| Wallet::new(user_id));

        // Pre-check the credit leg so the debit never needs undoing
        if !wallet.asset(to_asset).can_receive(to_amount) {
            return Err(internal(user_id, to_asset, "settle", "credit overflow"));
        }

        let from = wallet.asset_mut(from_asset);
        let debit = match source {
            FundsSource::Available => from.spend_available(from_amount),
            FundsSource::Locked => from.spend_locked(from_amount),
        };
        debit.map_err(|_| EngineError::InsufficientFunds)?;

        wallet
            .asset_mut(to_asset)
            .receive(to_amount)
            .map_err(|e| internal(user_id, to_asset, "settle", e))?;

        wallet.touch(now_millis());
        debug!(
            user_id,
            from = %from_asset,
            to = %to_asset,
            from_amount,
            to_amount,
            ?source,
            "Transfer settled"
        );
        Ok(())
    }

    /// Settle an external withdrawal: remove the gross `amount` from both
    /// `balance` and `locked`, incrementing `total_spent`.
    ///
    /// Callable only while the amount is still locked.
    pub fn settle_withdrawal(
        &self,
        user_id: UserId,
        asset: Asset,
        amount: u64,
    ) -> Result<(), EngineError> {
        let mut wallet = self
            .wallets
            .get_mut(&user_id)
            .ok_or(EngineError::WalletNotFound(user_id))?;
        wallet
            .asset_mut(asset)
            .spend_locked(amount)
            .map_err(|_| EngineError::InsufficientFunds)?;
        wallet.touch(now_millis());
        debug!(user_id, asset = %asset, amount, "Withdrawal settled");
        Ok(())
    }
}

fn internal(user_id: UserId, asset: Asset, op: &str, cause: &str) -> EngineError {
    // Arithmetic failures here indicate corrupted state, not user error
    error!(user_id, asset = %asset, op, cause, "Ledger arithmetic failure");
    EngineError::Internal(format!("{op} {asset} for user {user_id}: {cause}"))
}
