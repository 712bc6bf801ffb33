//! # podguard-audit
//!
//! Append-only audit trail for transfer safeguard events.
//!
//! Every safeguard-relevant transition (staged, confirmed, cancelled, failed,
//! expired, and the direct-transfer requested/completed pair) is written as
//! one `AuditEvent`. A failed write is an error, never silently dropped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use podguard_audit::JsonlAuditLog;
//! use podguard_core::traits::AuditWriter;
//!
//! let audit = JsonlAuditLog::new(config.audit_path());
//! audit.log(AuditEvent::new(event_type::TRANSFER_STAGED).transfer_id(id))?;
//! ```

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlAuditLog;
pub use memory::InMemoryAuditWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────
