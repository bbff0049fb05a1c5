//! Transfer settlement state machine.
//!
//! Conversions, swaps and withdrawals share one record lifecycle:
//!
//! ```text
//! PENDING → VALIDATING → PROCESSING → COMPLETED
//!    |           |            |
//!    |           +------------+--→ FAILED
//!    +--→ CANCELLED
//! ```
//!
//! They differ in what happens during `PROCESSING`:
//! - **Conversion** settles in one atomic ledger step; `locked` is never
//!   touched, so there is no in-flight window and nothing to compensate.
//! - **Swap** reserves the input first (`lock_funds`), settles from the
//!   reservation, and reports a synthetic settlement reference.
//! - **Withdrawal** reserves the gross amount, then calls the external
//!   settlement client; the fee comes from the network configuration.
//!
//! # Safety invariants
//!
//! 1. Validation failures happen before any lock - they never strand funds.
//! 2. Any failure after `lock_funds` runs `unlock_funds` before the record
//!    is marked failed; unlock floors at zero so repeating it is safe.
//! 3. Terminal records are immutable; repeated settlement callbacks for a
//!    finished id are no-ops.
//! 4. One task drives each transfer, so progress events arrive in phase
//!    order per id.

pub mod coordinator;
pub mod progress;
pub mod settlement;
pub mod state;
pub mod store;
pub mod types;


// Re-exports for convenience
pub use coordinator::TransferCoordinator;
pub use progress::{ChannelPublisher, NoopPublisher, ProgressEvent, ProgressPublisher};
pub use settlement::{SettlementClient, SettlementError, synthetic_reference};
pub use state::TransferStatus;
pub use store::TransferStore;
pub use types::{
    ConversionRequest, SwapRequest, TransferId, TransferKind, TransferReceipt, TransferRecord,
    WithdrawalDestination, WithdrawalRequest,
};
