//! Core type definitions shared across the ledger and transfer modules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// User identifier
pub type UserId = u64;

/// Fungible balance types tracked per user.
///
/// The set is closed: every ledger slot, rate pair and transfer references
/// one of these. `decimals()` fixes the scaled-integer representation for
/// each asset (see [`crate::money`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    /// Experience points, integral units
    Xp,
    /// Stable-value token, tracked in micro-units (10^-6)
    Usdt,
    /// Spin-game token, integral units
    Spin,
}

/// Number of supported assets (wallet slot count)
pub const ASSET_COUNT: usize = 3;

impl Asset {
    /// All supported assets, in wallet slot order
    pub const ALL: [Asset; ASSET_COUNT] = [Asset::Xp, Asset::Usdt, Asset::Spin];

    /// Wallet slot index for this asset
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Asset::Xp => 0,
            Asset::Usdt => 1,
            Asset::Spin => 2,
        }
    }

    /// Decimal places of the scaled integer representation
    #[inline(always)]
    pub const fn decimals(self) -> u32 {
        match self {
            Asset::Xp => 0,
            Asset::Usdt => 6,
            Asset::Spin => 0,
        }
    }

    /// Canonical uppercase symbol
    pub const fn symbol(self) -> &'static str {
        match self {
            Asset::Xp => "XP",
            Asset::Usdt => "USDT",
            Asset::Spin => "SPIN",
        }
    }

    /// Parse a client-provided symbol (case-insensitive)
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XP" => Some(Asset::Xp),
            "USDT" => Some(Asset::Usdt),
            "SPIN" => Some(Asset::Spin),
            _ => None,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Current UTC timestamp in milliseconds
#[inline]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
