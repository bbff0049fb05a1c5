//! Transaction record store.
//!
//! One durable record per transfer attempt. All status changes go through
//! compare-and-swap style transitions so concurrent drivers (or repeated
//! settlement callbacks) cannot move a record twice: a terminal record is
//! immutable and every mutator on it is a no-op.

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

use super::state::TransferStatus;
use super::types::{TransferId, TransferRecord};
use crate::core_types::now_millis;
use crate::error::EngineError;

/// In-memory record store keyed by transfer id.
#[derive(Debug, Default)]
pub struct TransferStore {
    records: DashMap<TransferId, TransferRecord>,
}

impl TransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a freshly created record.
    pub fn create(&self, record: TransferRecord) -> TransferId {
        let id = record.id;
        self.records.insert(id, record);
        id
    }

    /// Current snapshot of a record.
    pub fn get(&self, id: TransferId) -> Option<TransferRecord> {
        self.records.get(&id).map(|r| r.clone())
    }

    /// CAS transition: move `id` from `expect` to `next`, stamping the
    /// phase timestamp. Returns `Ok(false)` without mutating when the
    /// record is not in `expect` (already advanced, or terminal).
    pub fn update_status_if(
        &self,
        id: TransferId,
        expect: TransferStatus,
        next: TransferStatus,
    ) -> Result<bool, EngineError> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| EngineError::TransferNotFound(id.to_string()))?;

        if record.status != expect || record.status.is_terminal() {
            return Ok(false);
        }

        record.status = next;
        stamp(&mut record, next);
        debug!(transfer_id = %id, from = %expect, to = %next, "Status transition");
        Ok(true)
    }

    /// Record the quoted amounts during validation.
    pub fn record_quote(
        &self,
        id: TransferId,
        to_amount: u64,
        rate_applied: Option<Decimal>,
        fee_applied: u64,
    ) -> Result<(), EngineError> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| EngineError::TransferNotFound(id.to_string()))?;
        if record.status.is_terminal() {
            return Err(EngineError::ConcurrencyConflict);
        }
        record.to_amount = to_amount;
        record.rate_applied = rate_applied;
        record.fee_applied = fee_applied;
        Ok(())
    }

    /// CAS to `Completed` with the settlement reference. No-op (`false`)
    /// if the record already left `expect` - repeated settlement callbacks
    /// for a completed id land here.
    pub fn complete_if(
        &self,
        id: TransferId,
        expect: TransferStatus,
        external_ref: Option<String>,
    ) -> Result<bool, EngineError> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| EngineError::TransferNotFound(id.to_string()))?;

        if record.status != expect || record.status.is_terminal() {
            return Ok(false);
        }

        record.status = TransferStatus::Completed;
        record.external_ref = external_ref;
        record.completed_at = Some(now_millis());
        debug!(transfer_id = %id, "Transfer completed");
        Ok(true)
    }

    /// Move a record to `Failed` from any non-terminal status, capturing
    /// the causing error message. No-op (`false`) once terminal.
    pub fn fail(&self, id: TransferId, error: &str) -> Result<bool, EngineError> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| EngineError::TransferNotFound(id.to_string()))?;

        if record.status.is_terminal() {
            return Ok(false);
        }

        record.status = TransferStatus::Failed;
        record.error = Some(error.to_string());
        record.completed_at = Some(now_millis());
        debug!(transfer_id = %id, error, "Transfer failed");
        Ok(true)
    }
}

fn stamp(record: &mut TransferRecord, status: TransferStatus) {
    let now = now_millis();
    match status {
        TransferStatus::Validating => record.validated_at = Some(now),
        TransferStatus::Processing => record.processed_at = Some(now),
        TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled => {
            record.completed_at = Some(now);
        }
        TransferStatus::Pending => {}
    }
}
