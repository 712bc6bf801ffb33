//! Daily spend ledger records.

use serde::{Deserialize, Serialize};

/// One confirmed transfer counted against a day's limit.
///
/// Entries are append-only. Once written they are never mutated; the only
/// way they disappear is whole-day pruning. `timestamp` is kept verbatim as
/// it was written so files from older deployments round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendEntry {
    pub transfer_id: String,
    pub amount_cents: i64,
    pub timestamp: String,
}

/// The answer to "may this actor move `amount_cents` more today?".
///
/// `remaining_cents` is `ceiling - used` and is not clamped: a negative value
/// says by how much the actor is already over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitCheck {
    pub allowed: bool,
    pub remaining_cents: i64,
}
