//! Enforced per-asset balance type.
//!
//! This is the single source of truth for balance arithmetic. ALL balance
//! mutations go through these methods.
//!
//! # Invariants (enforced by private fields):
//! - `0 <= locked <= balance`, always
//! - `available = balance - locked` is the only amount eligible for new
//!   reservations
//! - No overflow/underflow (checked arithmetic)
//! - All state changes return `Result`, except `unlock` which floors at
//!   zero (it is the compensating action and must be safe to repeat)
//!
//! # Usage
//! ```ignore
//! let mut bal = AssetBalance::default();
//! bal.credit(1000)?;          // balance=1000, total_earned=1000
//! bal.lock(400)?;             // locked=400, available=600
//! bal.spend_locked(400)?;     // balance=600, locked=0, total_spent=400
//! ```

use serde::{Deserialize, Serialize};

/// Balance state for a single asset within one wallet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetBalance {
    balance: u64,      // PRIVATE - gross holdings, includes locked portion
    locked: u64,       // PRIVATE - reserved by in-flight transfers
    total_earned: u64, // PRIVATE - lifetime credits
    total_spent: u64,  // PRIVATE - lifetime debits
}

impl AssetBalance {
    // ============================================================
    // READ-ONLY GETTERS
    // ============================================================

    /// Gross balance (includes the locked portion)
    #[inline(always)]
    pub const fn balance(&self) -> u64 {
        self.balance
    }

    /// Funds reserved by in-flight transfers
    #[inline(always)]
    pub const fn locked(&self) -> u64 {
        self.locked
    }

    /// Spendable amount: `balance - locked`
    #[inline(always)]
    pub const fn available(&self) -> u64 {
        // Invariant locked <= balance makes this safe, but stay checked
        self.balance.saturating_sub(self.locked)
    }

    /// Lifetime credited amount
    #[inline(always)]
    pub const fn total_earned(&self) -> u64 {
        self.total_earned
    }

    /// Lifetime debited amount
    #[inline(always)]
    pub const fn total_spent(&self) -> u64 {
        self.total_spent
    }

    // ============================================================
    // VALIDATED MUTATIONS
    // ============================================================

    /// Credit funds (earn/deposit path).
    ///
    /// Validates fully before assigning: on error the slot is unchanged.
    ///
    /// # Errors
    /// Returns error on overflow.
    pub fn credit(&mut self, amount: u64) -> Result<(), &'static str> {
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or("Credit balance overflow")?;
        let total_earned = self
            .total_earned
            .checked_add(amount)
            .ok_or("Credit earned overflow")?;
        self.balance = balance;
        self.total_earned = total_earned;
        Ok(())
    }

    /// Whether a credit of `amount` would succeed (overflow pre-check).
    pub fn can_receive(&self, amount: u64) -> bool {
        self.balance.checked_add(amount).is_some()
            && self.total_earned.checked_add(amount).is_some()
    }

    /// Reserve funds for an in-flight transfer.
    ///
    /// The availability check and the increment are one operation on this
    /// value; callers must hold exclusive access to the wallet while
    /// invoking it (see `LedgerStore`).
    ///
    /// # Errors
    /// - "Insufficient available funds" if `available < amount`
    pub fn lock(&mut self, amount: u64) -> Result<(), &'static str> {
        if self.available() < amount {
            return Err("Insufficient available funds");
        }
        self.locked = self
            .locked
            .checked_add(amount)
            .ok_or("Lock overflow")?;
        Ok(())
    }

    /// Release a reservation (compensating action).
    ///
    /// Floors at zero and never fails: re-running the compensation for an
    /// already-unlocked transfer must be a no-op, not an error.
    pub fn unlock(&mut self, amount: u64) {
        self.locked = self.locked.saturating_sub(amount);
    }

    /// Debit spendable funds directly, without a prior reservation.
    ///
    /// Used by single-step settlement (conversion): the debit and the check
    /// happen in one operation, so there is no funds-in-flight window.
    ///
    /// # Errors
    /// - "Insufficient available funds" if `available < amount`
    pub fn spend_available(&mut self, amount: u64) -> Result<(), &'static str> {
        if self.available() < amount {
            return Err("Insufficient available funds");
        }
        let balance = self
            .balance
            .checked_sub(amount)
            .ok_or("Spend balance underflow")?;
        let total_spent = self
            .total_spent
            .checked_add(amount)
            .ok_or("Spend spent overflow")?;
        self.balance = balance;
        self.total_spent = total_spent;
        Ok(())
    }

    /// Debit previously locked funds (swap/withdrawal settlement).
    ///
    /// Removes `amount` from both `balance` and `locked`.
    ///
    /// # Errors
    /// - "Insufficient locked funds" if `locked < amount`
    pub fn spend_locked(&mut self, amount: u64) -> Result<(), &'static str> {
        if self.locked < amount {
            return Err("Insufficient locked funds");
        }
        let locked = self
            .locked
            .checked_sub(amount)
            .ok_or("Spend locked underflow")?;
        let balance = self
            .balance
            .checked_sub(amount)
            .ok_or("Spend balance underflow")?;
        let total_spent = self
            .total_spent
            .checked_add(amount)
            .ok_or("Spend spent overflow")?;
        self.locked = locked;
        self.balance = balance;
        self.total_spent = total_spent;
        Ok(())
    }

    /// Credit the receiving side of a settlement.
    ///
    /// Same effect as `credit`; kept separate so call sites read as the
    /// two legs of a transfer.
    pub fn receive(&mut self, amount: u64) -> Result<(), &'static str> {
        self.credit(amount)
    }

    /// Invariant check used by tests and debug assertions.
    pub fn is_consistent(&self) -> bool {
        self.locked <= self.balance
    }
}
