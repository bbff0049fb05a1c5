//! Transfer status definitions.
//!
//! Status IDs are stable integers suitable for durable storage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phases of a conversion, swap or withdrawal.
///
/// ```text
/// PENDING → VALIDATING → PROCESSING → COMPLETED
///    |           |            |
///    |           +------------+--→ FAILED
///    +--→ CANCELLED
/// ```
///
/// Terminal states: COMPLETED (40), FAILED (-10), CANCELLED (-30).
/// A record in a terminal state is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum TransferStatus {
    /// Record created, transfer not yet validated
    Pending = 0,

    /// Validation in progress (rates, ranges, funds)
    Validating = 10,

    /// Funds reserved / external settlement in flight
    Processing = 20,

    /// Terminal: settled, ledger mutation applied
    Completed = 40,

    /// Terminal: rejected or compensated, no value moved
    Failed = -10,

    /// Terminal: withdrawn by the user before validation (reserved path)
    Cancelled = -30,
}

impl TransferStatus {
    /// No more transitions possible from this status.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }

    /// Numeric status ID for storage.
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert back from a stored status ID.
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TransferStatus::Pending),
            10 => Some(TransferStatus::Validating),
            20 => Some(TransferStatus::Processing),
            40 => Some(TransferStatus::Completed),
            -10 => Some(TransferStatus::Failed),
            -30 => Some(TransferStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Validating => "VALIDATING",
            TransferStatus::Processing => "PROCESSING",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Failed => "FAILED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for TransferStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        TransferStatus::from_id(value).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());

        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Validating.is_terminal());
        assert!(!TransferStatus::Processing.is_terminal());
    }

    #[test]
    fn test_status_id_roundtrip() {
        let statuses = [
            TransferStatus::Pending,
            TransferStatus::Validating,
            TransferStatus::Processing,
            TransferStatus::Completed,
            TransferStatus::Failed,
            TransferStatus::Cancelled,
        ];
        for status in statuses {
            assert_eq!(TransferStatus::from_id(status.id()), Some(status));
        }
        assert!(TransferStatus::from_id(999).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferStatus::Pending.to_string(), "PENDING");
        assert_eq!(TransferStatus::Completed.to_string(), "COMPLETED");
    }
}
