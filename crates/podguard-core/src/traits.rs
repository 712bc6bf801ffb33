//! Collaborator traits for the transfer safeguards.
//!
//! These traits are the seams between the safeguard core and everything it
//! does not own:
//!
//! - `PlatformClient`: the remote financial platform (untrusted, slow)
//! - `SpendLedger`: the daily cumulative limit store
//! - `AuditWriter`: the append-only audit trail
//!
//! The transfer desk wires them together. Each has a blanket impl for
//! `Arc<T>` so hosting code can keep a handle on a component it hands over.

use std::sync::Arc;

use podguard_contracts::{
    account::AccountSet,
    activity::ActivityQuery,
    actor::ActorKey,
    audit::AuditEvent,
    error::{GuardResult, PlatformError},
    spend::LimitCheck,
    transfer::{TransferOrder, TransferReceipt},
};

/// The remote platform holding the accounts.
///
/// Every call is synchronous and may block. Implementations report business
/// refusals as `PlatformError::Rejected` and every other failure as
/// `PlatformError::Upstream`.
pub trait PlatformClient: Send + Sync {
    /// Fetch every pod, port, and external account with live balances.
    fn fetch_accounts(&self) -> Result<AccountSet, PlatformError>;

    /// Move money. Called only for transfers that passed every safeguard.
    fn execute_transfer(&self, order: &TransferOrder) -> Result<TransferReceipt, PlatformError>;

    /// Detailed view of one pod, including bank details and recent transfers.
    fn pod_detail(&self, pod_id: &str) -> Result<serde_json::Value, PlatformError>;

    /// A page of the activity feed.
    fn recent_activity(&self, query: &ActivityQuery) -> Result<serde_json::Value, PlatformError>;

    /// Full status of one executed transfer.
    fn transfer_status(&self, transfer_id: &str) -> Result<serde_json::Value, PlatformError>;

    /// Monthly counts of transfers, rule executions and incoming funds.
    fn activity_summary(&self) -> Result<serde_json::Value, PlatformError>;
}

/// The daily cumulative spending limit.
///
/// `check` is a pure read. `record` is write-through: when it returns `Ok`
/// the entry is durable.
pub trait SpendLedger: Send + Sync {
    fn check(&self, amount_cents: i64, actor: &ActorKey) -> LimitCheck;

    /// Count a transfer the platform has already executed.
    fn record(&self, amount_cents: i64, transfer_id: &str, actor: &ActorKey) -> GuardResult<()>;

    /// The configured ceiling per day and actor.
    fn max_daily_cents(&self) -> i64;
}

/// The append-only audit trail.
///
/// A failed write is returned to the caller, never swallowed.
pub trait AuditWriter: Send + Sync {
    fn log(&self, event: AuditEvent) -> GuardResult<()>;
}

impl<T: PlatformClient + ?Sized> PlatformClient for Arc<T> {
    fn fetch_accounts(&self) -> Result<AccountSet, PlatformError> {
        (**self).fetch_accounts()
    }

    fn execute_transfer(&self, order: &TransferOrder) -> Result<TransferReceipt, PlatformError> {
        (**self).execute_transfer(order)
    }

    fn pod_detail(&self, pod_id: &str) -> Result<serde_json::Value, PlatformError> {
        (**self).pod_detail(pod_id)
    }

    fn recent_activity(&self, query: &ActivityQuery) -> Result<serde_json::Value, PlatformError> {
        (**self).recent_activity(query)
    }

    fn transfer_status(&self, transfer_id: &str) -> Result<serde_json::Value, PlatformError> {
        (**self).transfer_status(transfer_id)
    }

    fn activity_summary(&self) -> Result<serde_json::Value, PlatformError> {
        (**self).activity_summary()
    }
}

impl<T: SpendLedger + ?Sized> SpendLedger for Arc<T> {
    fn check(&self, amount_cents: i64, actor: &ActorKey) -> LimitCheck {
        (**self).check(amount_cents, actor)
    }

    fn record(&self, amount_cents: i64, transfer_id: &str, actor: &ActorKey) -> GuardResult<()> {
        (**self).record(amount_cents, transfer_id, actor)
    }

    fn max_daily_cents(&self) -> i64 {
        (**self).max_daily_cents()
    }
}

impl<T: AuditWriter + ?Sized> AuditWriter for Arc<T> {
    fn log(&self, event: AuditEvent) -> GuardResult<()> {
        (**self).log(event)
    }
}
