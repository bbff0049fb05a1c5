//! Transfer orchestrator.
//!
//! Drives conversions, swaps and withdrawals through the shared state
//! machine: validate against the rate source, reserve funds in the ledger,
//! settle (internally or through the settlement client), and finalize or
//! compensate. Publishes a progress event at every phase transition.
//!
//! # Safety rules
//!
//! 1. Range and rate checks run before any lock is taken; a validation
//!    failure never leaves funds reserved.
//! 2. Every error path after a successful `lock_funds` runs the
//!    compensating `unlock_funds` before the record is marked failed.
//! 3. External settlement calls happen after the lock and outside any
//!    ledger guard; a concurrent request sees reduced availability while
//!    unrelated users are never blocked.
//! 4. Each transfer is driven by exactly one task (the CAS out of
//!    `Pending` elects it), so per-id progress events are in phase order.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::progress::{ProgressEvent, ProgressPublisher};
use super::settlement::{SettlementClient, synthetic_reference};
use super::state::TransferStatus;
use super::store::TransferStore;
use super::types::{
    ConversionRequest, SwapRequest, TransferId, TransferKind, TransferReceipt, TransferRecord,
    WithdrawalDestination, WithdrawalRequest,
};
use crate::core_types::Asset;
use crate::error::EngineError;
use crate::ledger::{FundsSource, LedgerStore};
use crate::money;
use crate::networks::NetworkTable;
use crate::rates::{RateTable, compute_conversion};

/// Orchestrates transfer processing against the ledger, rate source,
/// record store and external collaborators. All dependencies are injected.
pub struct TransferCoordinator {
    ledger: Arc<LedgerStore>,
    rates: Arc<RateTable>,
    networks: Arc<NetworkTable>,
    store: Arc<TransferStore>,
    settlement: Arc<dyn SettlementClient>,
    publisher: Arc<dyn ProgressPublisher>,
}

impl TransferCoordinator {
    pub fn new(
        ledger: Arc<LedgerStore>,
        rates: Arc<RateTable>,
        networks: Arc<NetworkTable>,
        store: Arc<TransferStore>,
        settlement: Arc<dyn SettlementClient>,
        publisher: Arc<dyn ProgressPublisher>,
    ) -> Self {
        Self {
            ledger,
            rates,
            networks,
            store,
            settlement,
            publisher,
        }
    }

    /// The ledger this coordinator settles against.
    pub fn ledger(&self) -> &Arc<LedgerStore> {
        &self.ledger
    }

    // ========================================================================
    // Inbound requests (from the excluded HTTP layer)
    // ========================================================================

    /// Start a conversion. Returns immediately with the record in
    /// `Pending`; the transfer proceeds asynchronously.
    pub async fn initiate_conversion(
        self: &Arc<Self>,
        req: ConversionRequest,
    ) -> Result<TransferReceipt, EngineError> {
        if req.from_asset == req.to_asset {
            return Err(EngineError::SameAsset);
        }
        let from_amount = money::parse_decimal(req.amount, req.from_asset.decimals())?;

        let record = TransferRecord::new_exchange(
            TransferKind::Conversion,
            req.user_id,
            req.from_asset,
            req.to_asset,
            from_amount,
        );
        self.accept(record).await
    }

    /// Start a swap with pre-agreed input and output amounts.
    pub async fn initiate_swap(
        self: &Arc<Self>,
        req: SwapRequest,
    ) -> Result<TransferReceipt, EngineError> {
        if req.from_asset == req.to_asset {
            return Err(EngineError::SameAsset);
        }
        let from_amount = money::parse_decimal(req.from_amount, req.from_asset.decimals())?;
        let to_amount = money::parse_decimal(req.to_amount, req.to_asset.decimals())?;

        let mut record = TransferRecord::new_exchange(
            TransferKind::Swap,
            req.user_id,
            req.from_asset,
            req.to_asset,
            from_amount,
        );
        record.to_amount = to_amount;
        self.accept(record).await
    }

    /// Start a withdrawal of the gross `amount` to an external address.
    pub async fn initiate_withdrawal(
        self: &Arc<Self>,
        req: WithdrawalRequest,
    ) -> Result<TransferReceipt, EngineError> {
        let asset = Asset::from_symbol(&req.coin)
            .ok_or_else(|| EngineError::UnsupportedAsset(req.coin.clone()))?;
        if req.address.trim().is_empty() {
            return Err(EngineError::MissingAddress);
        }
        let from_amount = money::parse_decimal(req.amount, asset.decimals())?;

        let record = TransferRecord::new_withdrawal(
            req.user_id,
            asset,
            from_amount,
            WithdrawalDestination {
                address: req.address,
                network: req.network,
            },
        );
        self.accept(record).await
    }

    /// Status query: current record snapshot.
    pub fn get_transaction(&self, id: TransferId) -> Result<TransferRecord, EngineError> {
        self.store
            .get(id)
            .ok_or_else(|| EngineError::TransferNotFound(id.to_string()))
    }

    /// Cancel a transfer that has not started validating. Returns whether
    /// the record moved; `false` means it already advanced or finished.
    pub async fn cancel(&self, id: TransferId) -> Result<bool, EngineError> {
        let cancelled =
            self.store
                .update_status_if(id, TransferStatus::Pending, TransferStatus::Cancelled)?;
        if cancelled {
            let record = self.get_transaction(id)?;
            info!(transfer_id = %id, "Transfer cancelled");
            self.publish(&record, None, None).await;
        }
        Ok(cancelled)
    }

    /// Persist the pending record, announce it, and spawn the driver task.
    async fn accept(
        self: &Arc<Self>,
        record: TransferRecord,
    ) -> Result<TransferReceipt, EngineError> {
        let id = self.store.create(record.clone());
        info!(transfer_id = %id, kind = %record.kind, user_id = record.user_id, "Transfer accepted");
        self.publish(&record, None, None).await;

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.drive(id, record.kind).await;
        });

        Ok(TransferReceipt {
            transfer_id: id,
            status: TransferStatus::Pending,
        })
    }

    async fn drive(&self, id: TransferId, kind: TransferKind) {
        match kind {
            TransferKind::Conversion => self.drive_conversion(id).await,
            TransferKind::Swap => self.drive_swap(id).await,
            TransferKind::Withdrawal => self.drive_withdrawal(id).await,
        }
    }

    // ========================================================================
    // Conversion: one-step settlement, no reservation
    // ========================================================================

    async fn drive_conversion(&self, id: TransferId) {
        let Some(record) = self.claim(id).await else {
            return;
        };
        let user_id = record.user_id;
        let from = record.from_asset;
        // Exchange records always carry a target asset
        let Some(to) = record.to_asset else {
            self.reject(id, &EngineError::Internal("conversion without target".into()))
                .await;
            return;
        };

        // Validate: rate active, amount in range, funds available
        let amount = money::to_decimal(record.from_amount, from.decimals());
        let quote = match self
            .rates
            .get_active_rate(from, to)
            .ok_or(EngineError::RateNotFound { from, to })
            .and_then(|rate| {
                compute_conversion(&rate, amount).map(|q| (rate, q))
            }) {
            Ok(v) => v,
            Err(e) => {
                self.reject(id, &e).await;
                return;
            }
        };
        let (rate, quote) = quote;

        let scaled = money::to_scaled_floor(quote.output, to.decimals())
            .and_then(|out| {
                money::to_scaled_floor(quote.fee, from.decimals()).map(|fee| (out, fee))
            });
        let (to_amount, fee_amount) = match scaled {
            Ok(v) => v,
            Err(e) => {
                self.reject(id, &EngineError::from(e)).await;
                return;
            }
        };

        if self.ledger.available(user_id, from) < record.from_amount {
            self.reject(id, &EngineError::InsufficientFunds).await;
            return;
        }

        if let Err(e) = self
            .store
            .record_quote(id, to_amount, Some(rate.rate), fee_amount)
        {
            self.reject(id, &e).await;
            return;
        }
        if !self.advance(id, TransferStatus::Validating, TransferStatus::Processing).await {
            return;
        }

        // Single atomic step: debit available, credit target. No lock is
        // ever taken, so there is no funds-in-flight window to compensate.
        if let Err(e) = self.ledger.settle_transfer(
            user_id,
            from,
            to,
            record.from_amount,
            to_amount,
            FundsSource::Available,
        ) {
            self.reject(id, &e).await;
            return;
        }

        self.finish(id, None).await;
    }

    // ========================================================================
    // Swap: reserve, settle from the reservation, synthetic reference
    // ========================================================================

    async fn drive_swap(&self, id: TransferId) {
        let Some(record) = self.claim(id).await else {
            return;
        };
        let user_id = record.user_id;
        let from = record.from_asset;
        let Some(to) = record.to_asset else {
            self.reject(id, &EngineError::Internal("swap without target".into()))
                .await;
            return;
        };

        if self.ledger.available(user_id, from) < record.from_amount {
            self.reject(id, &EngineError::InsufficientFunds).await;
            return;
        }

        let implied_rate = implied_rate(&record, from, to);
        if let Err(e) = self
            .store
            .record_quote(id, record.to_amount, implied_rate, 0)
        {
            self.reject(id, &e).await;
            return;
        }

        // Reserve. The availability check and increment are one atomic
        // ledger operation; a failure here has locked nothing.
        if let Err(e) = self.ledger.lock_funds(user_id, from, record.from_amount) {
            self.reject(id, &e).await;
            return;
        }

        // Funds are reserved: every exit below must settle or unlock.
        if !self.advance(id, TransferStatus::Validating, TransferStatus::Processing).await {
            self.ledger.unlock_funds(user_id, from, record.from_amount);
            return;
        }

        if let Err(e) = self.ledger.settle_transfer(
            user_id,
            from,
            to,
            record.from_amount,
            record.to_amount,
            FundsSource::Locked,
        ) {
            self.compensate(id, user_id, from, record.from_amount, &e).await;
            return;
        }

        self.finish(id, Some(synthetic_reference())).await;
    }

    // ========================================================================
    // Withdrawal: reserve gross, external send, settle from the reservation
    // ========================================================================

    async fn drive_withdrawal(&self, id: TransferId) {
        let Some(record) = self.claim(id).await else {
            return;
        };
        let user_id = record.user_id;
        let asset = record.from_asset;
        let Some(destination) = record.destination.clone() else {
            self.reject(id, &EngineError::Internal("withdrawal without destination".into()))
                .await;
            return;
        };

        let Some(network) = self.networks.get(asset.symbol(), &destination.network) else {
            self.reject(
                id,
                &EngineError::NetworkNotFound(format!(
                    "{}/{}",
                    asset.symbol(),
                    destination.network
                )),
            )
            .await;
            return;
        };

        // Fee comes from the network configuration, never from the request
        let gross = money::to_decimal(record.from_amount, asset.decimals());
        let net = gross - network.withdraw_fee;
        if net <= Decimal::ZERO {
            self.reject(
                id,
                &EngineError::FeeExceedsAmount {
                    fee: network.withdraw_fee,
                },
            )
            .await;
            return;
        }
        if gross < network.minimum_withdraw {
            self.reject(
                id,
                &EngineError::AmountTooSmall {
                    min: network.minimum_withdraw,
                },
            )
            .await;
            return;
        }
        if self.ledger.available(user_id, asset) < record.from_amount {
            self.reject(id, &EngineError::InsufficientFunds).await;
            return;
        }

        let scaled = money::to_scaled_floor(net, asset.decimals()).and_then(|n| {
            money::to_scaled_floor(network.withdraw_fee, asset.decimals()).map(|f| (n, f))
        });
        let (net_amount, fee_amount) = match scaled {
            Ok(v) => v,
            Err(e) => {
                self.reject(id, &EngineError::from(e)).await;
                return;
            }
        };
        if let Err(e) = self.store.record_quote(id, net_amount, None, fee_amount) {
            self.reject(id, &e).await;
            return;
        }

        // Reserve the gross amount (fee included) before any external call
        if let Err(e) = self.ledger.lock_funds(user_id, asset, record.from_amount) {
            self.reject(id, &e).await;
            return;
        }

        if !self.advance(id, TransferStatus::Validating, TransferStatus::Processing).await {
            self.ledger.unlock_funds(user_id, asset, record.from_amount);
            return;
        }

        // Operational precondition: the custodial hot wallet must cover
        // the net send. Failing this is not a user error.
        match self
            .settlement
            .external_balance(&destination.network, &network.hot_wallet_address)
            .await
        {
            Ok(hot_balance) if hot_balance < net_amount => {
                warn!(
                    transfer_id = %id,
                    hot_balance,
                    net_amount,
                    "Hot wallet cannot cover withdrawal"
                );
                self.compensate(
                    id,
                    user_id,
                    asset,
                    record.from_amount,
                    &EngineError::InsufficientHotWalletBalance,
                )
                .await;
                return;
            }
            Ok(_) => {}
            Err(e) => {
                self.compensate(
                    id,
                    user_id,
                    asset,
                    record.from_amount,
                    &EngineError::SettlementFailed(e.to_string()),
                )
                .await;
                return;
            }
        }

        let tx_hash = match self
            .settlement
            .send(&destination.network, asset, &destination.address, net_amount)
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                self.compensate(
                    id,
                    user_id,
                    asset,
                    record.from_amount,
                    &EngineError::SettlementFailed(e.to_string()),
                )
                .await;
                return;
            }
        };

        // Value has left custody: deduct the gross amount from balance and
        // locked. A failure here is corruption - the reservation must NOT
        // be released, or the user could spend funds that were sent.
        if let Err(e) = self
            .ledger
            .settle_withdrawal(user_id, asset, record.from_amount)
        {
            error!(
                transfer_id = %id,
                user_id,
                error = %e,
                tx_hash,
                "Withdrawal sent but ledger settle failed; manual reconciliation required"
            );
            let _ = self.store.fail(id, &e.to_string());
            let record = self.store.get(id);
            if let Some(record) = record {
                self.publish(&record, Some(tx_hash), Some(e.to_string())).await;
            }
            return;
        }

        self.finish(id, Some(tx_hash)).await;
    }

    // ========================================================================
    // Shared transition helpers
    // ========================================================================

    /// Elect this task as the driver: CAS `Pending -> Validating`.
    /// Returns the record snapshot, or `None` when another actor (cancel,
    /// concurrent driver) already advanced it.
    async fn claim(&self, id: TransferId) -> Option<TransferRecord> {
        match self
            .store
            .update_status_if(id, TransferStatus::Pending, TransferStatus::Validating)
        {
            Ok(true) => {
                let record = self.store.get(id)?;
                self.publish(&record, None, None).await;
                Some(record)
            }
            Ok(false) => None,
            Err(e) => {
                error!(transfer_id = %id, error = %e, "Failed to claim transfer");
                None
            }
        }
    }

    /// CAS to the next phase and publish it. `false` means the record was
    /// concurrently finalized.
    async fn advance(&self, id: TransferId, expect: TransferStatus, next: TransferStatus) -> bool {
        match self.store.update_status_if(id, expect, next) {
            Ok(true) => {
                if let Some(record) = self.store.get(id) {
                    self.publish(&record, None, None).await;
                }
                true
            }
            Ok(false) => {
                warn!(transfer_id = %id, %expect, %next, "Phase transition lost, stopping driver");
                false
            }
            Err(e) => {
                error!(transfer_id = %id, error = %e, "Phase transition error");
                false
            }
        }
    }

    /// Pre-lock failure: mark failed and publish. No funds are reserved.
    async fn reject(&self, id: TransferId, err: &EngineError) {
        info!(transfer_id = %id, code = err.code(), error = %err, "Transfer rejected");
        let _ = self.store.fail(id, &err.to_string());
        if let Some(record) = self.store.get(id) {
            self.publish(&record, None, Some(err.to_string())).await;
        }
    }

    /// Post-lock failure: release the reservation, then mark failed and
    /// publish. Unlock floors at zero, so re-running is harmless.
    async fn compensate(
        &self,
        id: TransferId,
        user_id: u64,
        asset: Asset,
        amount: u64,
        err: &EngineError,
    ) {
        warn!(
            transfer_id = %id,
            user_id,
            asset = %asset,
            amount,
            code = err.code(),
            "Compensating failed transfer"
        );
        self.ledger.unlock_funds(user_id, asset, amount);
        let _ = self.store.fail(id, &err.to_string());
        if let Some(record) = self.store.get(id) {
            self.publish(&record, None, Some(err.to_string())).await;
        }
    }

    /// Mark completed (no-op for already-terminal records) and publish.
    async fn finish(&self, id: TransferId, external_ref: Option<String>) {
        match self
            .store
            .complete_if(id, TransferStatus::Processing, external_ref.clone())
        {
            Ok(true) => {
                info!(transfer_id = %id, "Transfer completed");
                if let Some(record) = self.store.get(id) {
                    self.publish(&record, external_ref, None).await;
                }
            }
            Ok(false) => {
                // Already terminal: repeated finalization is a no-op
                warn!(transfer_id = %id, "Completion skipped, record already terminal");
            }
            Err(e) => {
                error!(transfer_id = %id, error = %e, "Completion error");
            }
        }
    }

    async fn publish(
        &self,
        record: &TransferRecord,
        tx_hash: Option<String>,
        error: Option<String>,
    ) {
        let to_decimals = record.to_asset.unwrap_or(record.from_asset).decimals();
        let mut event = ProgressEvent::new(
            record.id,
            record.kind,
            record.status,
            record.from_asset,
            record.to_asset,
            money::to_decimal(record.from_amount, record.from_asset.decimals()),
            money::to_decimal(record.to_amount, to_decimals),
        );
        event.tx_hash = tx_hash.or_else(|| record.external_ref.clone());
        event.error = error.or_else(|| record.error.clone());
        self.publisher.publish(record.user_id, event).await;
    }
}

fn implied_rate(record: &TransferRecord, from: Asset, to: Asset) -> Option<Decimal> {
    let from_dec = money::to_decimal(record.from_amount, from.decimals());
    let to_dec = money::to_decimal(record.to_amount, to.decimals());
    to_dec.checked_div(from_dec)
}
