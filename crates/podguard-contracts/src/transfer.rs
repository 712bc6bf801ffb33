//! Transfer staging and execution records.
//!
//! `PendingTransfer` is what the staging step holds between "stage" and
//! "confirm/cancel". The remaining types are the payloads handed back to
//! callers and the order sent to the remote platform.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{account::AccountKind, actor::ActorId};

/// Generate a fresh, unique pending-transfer id.
pub fn generate_transfer_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A validated transfer awaiting explicit confirmation.
///
/// Immutable once staged. Lives only in process memory; a restart drops
/// every pending transfer, which simply means they must be staged again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub source_id: String,
    pub source_name: String,
    pub source_type: AccountKind,
    pub destination_id: String,
    pub destination_name: String,
    pub destination_type: AccountKind,
    /// Always greater than zero.
    pub amount_cents: i64,
    pub amount_display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// The actor who staged it. `None` means any caller may manage it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ActorId>,
}

impl PendingTransfer {
    /// True once strictly more than `ttl` has elapsed since staging.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }

    /// True when both sides carry an identity and they differ.
    ///
    /// Anonymous callers and unowned transfers skip the ownership check.
    pub fn is_foreign_to(&self, actor: Option<&ActorId>) -> bool {
        match (&self.owner, actor) {
            (Some(owner), Some(actor)) => owner != actor,
            _ => false,
        }
    }

    /// The order the platform should execute for this transfer.
    pub fn to_order(&self) -> TransferOrder {
        TransferOrder {
            source_id: self.source_id.clone(),
            source_type: self.source_type,
            destination_id: self.destination_id.clone(),
            destination_type: self.destination_type,
            amount_cents: self.amount_cents,
            description: self.note.clone().unwrap_or_default(),
            instant: false,
        }
    }
}

/// A caller's request to move money between two named accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source_name: String,
    pub destination_name: String,
    pub amount_dollars: f64,
    #[serde(default)]
    pub note: String,
}

impl TransferRequest {
    pub fn new(
        source_name: impl Into<String>,
        destination_name: impl Into<String>,
        amount_dollars: f64,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            destination_name: destination_name.into(),
            amount_dollars,
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// The confirmation payload returned after a successful stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedTransfer {
    pub pending_transfer_id: String,
    pub source: String,
    pub destination: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub message: String,
}

/// A staged transfer that the platform has executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTransfer {
    pub success: bool,
    pub transfer_id: String,
    pub source: String,
    pub destination: String,
    pub amount: String,
    pub amount_cents: i64,
    pub receipt: TransferReceipt,
}

/// The result of a successful cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledTransfer {
    pub success: bool,
    pub cancelled: String,
    pub source: String,
    pub destination: String,
    pub amount: String,
}

/// A transfer instruction for the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOrder {
    pub source_id: String,
    pub source_type: AccountKind,
    pub destination_id: String,
    pub destination_type: AccountKind,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instant: bool,
}

/// What the platform reports back for an executed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
