//! In-memory implementation of `AuditWriter`.
//!
//! Keeps every event in a `Vec` behind `Arc<Mutex<_>>`. Clones share the
//! same buffer, so a test or demo can hand one clone to the desk and read
//! events back through another.

use std::sync::{Arc, Mutex};

use podguard_contracts::{
    audit::AuditEvent,
    error::{GuardError, GuardResult},
};
use podguard_core::traits::AuditWriter;

#[derive(Clone, Default)]
pub struct InMemoryAuditWriter {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event written so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The `event_type` of each event, in order.
    pub fn event_types(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event_type).collect()
    }
}

impl AuditWriter for InMemoryAuditWriter {
    fn log(&self, event: AuditEvent) -> GuardResult<()> {
        let mut events = self.events.lock().map_err(|e| GuardError::AuditWriteFailed {
            reason: format!("audit buffer lock poisoned: {}", e),
        })?;
        events.push(event);
        Ok(())
    }
}
