//! Engine error taxonomy.
//!
//! One enum covers the whole validation/not-found/funds/settlement surface
//! so API layers can map errors to codes and statuses uniformly.
//! Validation and not-found errors are raised before any lock is taken;
//! anything after a successful lock triggers the compensating unlock before
//! being surfaced.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::core_types::{Asset, UserId};
use crate::money::MoneyError;

/// Errors produced by the ledger, rate source and transfer orchestrator.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    // === Validation (pre-lock, user-caused) ===
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Amount precision exceeds asset limit ({provided} > {max} decimals)")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Invalid amount format: {0}")]
    InvalidAmountFormat(String),

    #[error("Source and target asset cannot be the same")]
    SameAsset,

    #[error("Unsupported asset: {0}")]
    UnsupportedAsset(String),

    #[error("Amount is below the minimum of {min}")]
    AmountTooSmall { min: Decimal },

    #[error("Amount exceeds the maximum of {max}")]
    AmountTooLarge { max: Decimal },

    #[error("Withdrawal fee {fee} leaves nothing to send")]
    FeeExceedsAmount { fee: Decimal },

    #[error("Destination address must not be empty")]
    MissingAddress,

    // === Not found (pre-lock) ===
    #[error("No active rate for {from} -> {to}")]
    RateNotFound { from: Asset, to: Asset },

    #[error("Network configuration not found: {0}")]
    NetworkNotFound(String),

    #[error("Wallet not found for user {0}")]
    WalletNotFound(UserId),

    #[error("Transfer not found: {0}")]
    TransferNotFound(String),

    // === Funds ===
    #[error("Insufficient funds")]
    InsufficientFunds,

    // === Operational (post-lock, not user-caused) ===
    #[error("Hot wallet balance is insufficient for this withdrawal")]
    InsufficientHotWalletBalance,

    #[error("Settlement failed: {0}")]
    SettlementFailed(String),

    // === System ===
    #[error("Concurrent modification, retry the operation")]
    ConcurrencyConflict,

    #[error("Internal ledger error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Stable error code for API responses and event payloads.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidAmount => "INVALID_AMOUNT",
            EngineError::PrecisionOverflow { .. } => "PRECISION_OVERFLOW",
            EngineError::InvalidAmountFormat(_) => "INVALID_AMOUNT_FORMAT",
            EngineError::SameAsset => "SAME_ASSET",
            EngineError::UnsupportedAsset(_) => "UNSUPPORTED_ASSET",
            EngineError::AmountTooSmall { .. } => "AMOUNT_TOO_SMALL",
            EngineError::AmountTooLarge { .. } => "AMOUNT_TOO_LARGE",
            EngineError::FeeExceedsAmount { .. } => "FEE_EXCEEDS_AMOUNT",
            EngineError::MissingAddress => "MISSING_ADDRESS",
            EngineError::RateNotFound { .. } => "RATE_NOT_FOUND",
            EngineError::NetworkNotFound(_) => "NETWORK_NOT_FOUND",
            EngineError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            EngineError::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            EngineError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            EngineError::InsufficientHotWalletBalance => "INSUFFICIENT_HOT_WALLET_BALANCE",
            EngineError::SettlementFailed(_) => "SETTLEMENT_FAILED",
            EngineError::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            EngineError::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status suggestion for the excluded API layer.
    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::InvalidAmount
            | EngineError::PrecisionOverflow { .. }
            | EngineError::InvalidAmountFormat(_)
            | EngineError::SameAsset
            | EngineError::UnsupportedAsset(_)
            | EngineError::AmountTooSmall { .. }
            | EngineError::AmountTooLarge { .. }
            | EngineError::FeeExceedsAmount { .. }
            | EngineError::MissingAddress => 400,
            EngineError::RateNotFound { .. }
            | EngineError::NetworkNotFound(_)
            | EngineError::TransferNotFound(_) => 404,
            EngineError::InsufficientFunds => 422,
            EngineError::InsufficientHotWalletBalance | EngineError::SettlementFailed(_) => 502,
            EngineError::ConcurrencyConflict => 409,
            EngineError::WalletNotFound(_) | EngineError::Internal(_) => 500,
        }
    }

    /// Whether the error was raised by an external/operational condition
    /// after funds were reserved, as opposed to a user input problem.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientHotWalletBalance
                | EngineError::SettlementFailed(_)
                | EngineError::Internal(_)
        )
    }
}

impl From<MoneyError> for EngineError {
    fn from(e: MoneyError) -> Self {
        match e {
            MoneyError::InvalidAmount => EngineError::InvalidAmount,
            MoneyError::PrecisionOverflow { provided, max } => {
                EngineError::PrecisionOverflow { provided, max }
            }
            MoneyError::Overflow => EngineError::InvalidAmountFormat("overflow".into()),
            MoneyError::InvalidFormat(s) => EngineError::InvalidAmountFormat(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(EngineError::InsufficientFunds.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(EngineError::SameAsset.code(), "SAME_ASSET");
        assert_eq!(
            EngineError::InsufficientHotWalletBalance.code(),
            "INSUFFICIENT_HOT_WALLET_BALANCE"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(EngineError::InvalidAmount.http_status(), 400);
        assert_eq!(EngineError::InsufficientFunds.http_status(), 422);
        assert_eq!(
            EngineError::TransferNotFound("x".into()).http_status(),
            404
        );
        assert_eq!(EngineError::InsufficientHotWalletBalance.http_status(), 502);
    }

    #[test]
    fn test_operational_classification() {
        assert!(EngineError::InsufficientHotWalletBalance.is_operational());
        assert!(EngineError::SettlementFailed("node down".into()).is_operational());
        assert!(!EngineError::InsufficientFunds.is_operational());
    }

    #[test]
    fn test_money_error_mapping() {
        let e: EngineError = MoneyError::InvalidAmount.into();
        assert!(matches!(e, EngineError::InvalidAmount));
        let e: EngineError = MoneyError::PrecisionOverflow { provided: 8, max: 6 }.into();
        assert_eq!(e.code(), "PRECISION_OVERFLOW");
    }
}
