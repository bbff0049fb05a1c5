//! Transfer record and request types.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::state::TransferStatus;
use crate::core_types::{Asset, UserId, now_millis};

/// Caller-visible transfer identifier.
///
/// ULID-based: monotonic, sortable, no coordination needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// The three transfer kinds sharing the state machine skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// Intra-ledger exchange, one-step settlement
    Conversion,
    /// Intra-ledger exchange with an explicit sending phase
    Swap,
    /// Externally settled send to an on-chain address
    Withdrawal,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Conversion => "CONVERSION",
            TransferKind::Swap => "SWAP",
            TransferKind::Withdrawal => "WITHDRAWAL",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a withdrawal sends its funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalDestination {
    pub address: String,
    pub network: String,
}

/// Durable description of one transfer attempt and its outcome.
///
/// Created in `Pending` at request time; mutated only through
/// [`super::store::TransferStore`]; immutable once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: TransferId,
    pub user_id: UserId,
    pub kind: TransferKind,
    pub from_asset: Asset,
    /// `None` for withdrawals, which carry a destination instead
    pub to_asset: Option<Asset>,
    pub destination: Option<WithdrawalDestination>,
    /// Gross input amount in from-asset minor units
    pub from_amount: u64,
    /// Credited/sent amount in to-asset (or from-asset for withdrawals)
    /// minor units; filled during validation
    pub to_amount: u64,
    pub rate_applied: Option<Decimal>,
    /// Fee in from-asset minor units
    pub fee_applied: u64,
    pub status: TransferStatus,
    /// Settlement reference (transaction hash), once known
    pub external_ref: Option<String>,
    /// Human-readable failure reason, once failed
    pub error: Option<String>,
    pub requested_at: i64,
    pub validated_at: Option<i64>,
    pub processed_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl TransferRecord {
    /// Create a conversion/swap record in `Pending`.
    pub fn new_exchange(
        kind: TransferKind,
        user_id: UserId,
        from_asset: Asset,
        to_asset: Asset,
        from_amount: u64,
    ) -> Self {
        Self {
            id: TransferId::new(),
            user_id,
            kind,
            from_asset,
            to_asset: Some(to_asset),
            destination: None,
            from_amount,
            to_amount: 0,
            rate_applied: None,
            fee_applied: 0,
            status: TransferStatus::Pending,
            external_ref: None,
            error: None,
            requested_at: now_millis(),
            validated_at: None,
            processed_at: None,
            completed_at: None,
        }
    }

    /// Create a withdrawal record in `Pending`.
    pub fn new_withdrawal(
        user_id: UserId,
        asset: Asset,
        from_amount: u64,
        destination: WithdrawalDestination,
    ) -> Self {
        Self {
            id: TransferId::new(),
            user_id,
            kind: TransferKind::Withdrawal,
            from_asset: asset,
            to_asset: None,
            destination: Some(destination),
            from_amount,
            to_amount: 0,
            rate_applied: None,
            fee_applied: 0,
            status: TransferStatus::Pending,
            external_ref: None,
            error: None,
            requested_at: now_millis(),
            validated_at: None,
            processed_at: None,
            completed_at: None,
        }
    }
}

impl fmt::Display for TransferRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer[{}] {} user={} {} -> {} status={}",
            self.id,
            self.kind,
            self.user_id,
            self.from_asset,
            self.to_asset
                .map(|a| a.symbol().to_string())
                .unwrap_or_else(|| "external".to_string()),
            self.status
        )
    }
}

/// Immediate response to an initiate call; the transfer itself proceeds
/// asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_id: TransferId,
    pub status: TransferStatus,
}

/// Conversion request: `amount` of `from_asset` exchanged at the active
/// rate into `to_asset`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionRequest {
    pub user_id: UserId,
    pub from_asset: Asset,
    pub to_asset: Asset,
    pub amount: Decimal,
}

/// Swap request: pre-agreed input and output amounts.
#[derive(Debug, Clone, Deserialize)]
pub struct SwapRequest {
    pub user_id: UserId,
    pub from_asset: Asset,
    pub to_asset: Asset,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
}

/// Withdrawal request: gross `amount` of `coin` sent over `network`.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalRequest {
    pub user_id: UserId,
    pub coin: String,
    pub network: String,
    pub address: String,
    pub amount: Decimal,
}
