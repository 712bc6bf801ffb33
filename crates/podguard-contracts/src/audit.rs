//! Audit event records.
//!
//! One `AuditEvent` is written per safeguard-relevant transition. Optional
//! fields are omitted from the serialized form when absent, never written as
//! `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId};

/// Well-known values of `AuditEvent::event_type`.
///
/// The field itself is free-form; these are the tags the runtime emits.
pub mod event_type {
    pub const TRANSFER_STAGED: &str = "transfer_staged";
    pub const TRANSFER_CONFIRMED: &str = "transfer_confirmed";
    pub const TRANSFER_CANCELLED: &str = "transfer_cancelled";
    pub const TRANSFER_FAILED: &str = "transfer_failed";
    pub const TRANSFER_EXPIRED: &str = "transfer_expired";
    pub const TRANSFER_REQUESTED: &str = "transfer_requested";
    pub const TRANSFER_COMPLETED: &str = "transfer_completed";
}

/// A single append-only audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    /// Start an event of the given type, stamped with the current UTC time.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type: event_type.into(),
            user_id: None,
            user_name: None,
            transfer_id: None,
            amount_cents: None,
            source: None,
            destination: None,
            note: None,
            error: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach the actor's id and, when known, their display name.
    pub fn actor(mut self, actor: Option<&Actor>) -> Self {
        if let Some(actor) = actor {
            self.user_id = Some(actor.id.clone());
            self.user_name = actor.name.clone();
        }
        self
    }

    pub fn transfer_id(mut self, transfer_id: impl Into<String>) -> Self {
        self.transfer_id = Some(transfer_id.into());
        self
    }

    pub fn amount_cents(mut self, amount_cents: i64) -> Self {
        self.amount_cents = Some(amount_cents);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Attach a note. Empty notes are treated as absent.
    pub fn note(mut self, note: Option<&str>) -> Self {
        self.note = note.filter(|n| !n.is_empty()).map(str::to_string);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
