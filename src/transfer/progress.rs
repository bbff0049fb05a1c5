//! Progress publishing.
//!
//! Phase-change events are pushed to the initiating user's channel. The
//! publisher is an injected dependency of the coordinator - never a
//! process-wide singleton - so tests can capture events and deployments
//! can plug in a real pub/sub transport.
//!
//! Delivery is at-least-once; consumers deduplicate by
//! `(transfer_id, status)`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use super::state::TransferStatus;
use super::types::{TransferId, TransferKind};
use crate::core_types::{Asset, UserId, now_millis};

/// One phase-change notification for a transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub transfer_id: TransferId,
    pub kind: TransferKind,
    pub status: TransferStatus,
    pub from_asset: Asset,
    pub to_asset: Option<Asset>,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

impl ProgressEvent {
    pub fn new(
        transfer_id: TransferId,
        kind: TransferKind,
        status: TransferStatus,
        from_asset: Asset,
        to_asset: Option<Asset>,
        from_amount: Decimal,
        to_amount: Decimal,
    ) -> Self {
        Self {
            transfer_id,
            kind,
            status,
            from_asset,
            to_asset,
            from_amount,
            to_amount,
            tx_hash: None,
            error: None,
            timestamp: now_millis(),
        }
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Broadcasts phase-change events to the owning user's channel.
#[async_trait]
pub trait ProgressPublisher: Send + Sync {
    async fn publish(&self, user_id: UserId, event: ProgressEvent);
}

/// Publisher backed by an unbounded tokio channel.
///
/// The consuming side (websocket fan-out, bot notifier, test assertions)
/// receives `(user_id, event)` pairs in publish order.
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<(UserId, ProgressEvent)>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(UserId, ProgressEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ProgressPublisher for ChannelPublisher {
    async fn publish(&self, user_id: UserId, event: ProgressEvent) {
        if self.tx.send((user_id, event)).is_err() {
            // Receiver dropped: progress is best-effort, settlement is not
            warn!(user_id, "Progress channel closed, event dropped");
        }
    }
}

/// Publisher that discards all events.
#[derive(Debug, Default)]
pub struct NoopPublisher;

#[async_trait]
impl ProgressPublisher for NoopPublisher {
    async fn publish(&self, _user_id: UserId, _event: ProgressEvent) {}
}
