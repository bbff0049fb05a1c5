//! Multi-asset rewards ledger with an asynchronous transfer engine.
//!
//! The crate keeps per-user wallets for a fixed set of assets and moves
//! value between them through three flows that share one state machine:
//!
//! - **Conversion**: rate-table exchange settled in a single atomic
//!   ledger step.
//! - **Swap**: pre-agreed exchange that reserves the source funds first
//!   and settles from the reservation.
//! - **Withdrawal**: on-chain send through a [`SettlementClient`], with
//!   the gross amount (fee included) reserved until the send confirms.
//!
//! Wallet mutations are all-or-nothing and preserve
//! `0 <= locked <= balance` per asset. Every post-reservation failure
//! path releases the reservation before the record is marked failed;
//! the one exception is a ledger settle failure after an external send
//! already moved value, which is logged for manual reconciliation.
//!
//! Entry point is [`TransferCoordinator`]; collaborators (ledger, rate
//! table, network table, settlement client, progress publisher) are
//! injected so tests can swap the external ones.
//!
//! [`SettlementClient`]: transfer::SettlementClient
//! [`TransferCoordinator`]: transfer::TransferCoordinator

pub mod balance;
pub mod config;
pub mod core_types;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod money;
pub mod networks;
pub mod rates;
pub mod transfer;
pub mod wallet;

pub use balance::AssetBalance;
pub use config::AppConfig;
pub use core_types::{Asset, UserId};
pub use error::EngineError;
pub use ledger::{FundsSource, LedgerStore};
pub use networks::{NetworkConfig, NetworkTable};
pub use rates::{Rate, RateTable};
pub use transfer::{
    ChannelPublisher, ConversionRequest, NoopPublisher, ProgressEvent, ProgressPublisher,
    SettlementClient, SettlementError, SwapRequest, TransferCoordinator, TransferId, TransferKind,
    TransferReceipt, TransferRecord, TransferStatus, TransferStore, WithdrawalRequest,
};
pub use wallet::Wallet;
