//! # podguard-core
//!
//! The safeguard runtime that sits between an agent and a money-moving
//! platform.
//!
//! This crate provides:
//! - The collaborator traits (`PlatformClient`, `SpendLedger`, `AuditWriter`, `Clock`)
//! - The account resolver
//! - The `TransferDesk`, which enforces stage → confirm/cancel/expire
//! - Deployment configuration, request throttling and message rate limiting
//!
//! ## Usage
//!
//! ```rust,ignore
//! use podguard_core::{TransferDesk, DeskLimits, traits::PlatformClient};
//!
//! let desk = TransferDesk::new(platform, DeskLimits::default())
//!     .with_ledger(Box::new(tracker))
//!     .with_audit(Box::new(audit_log));
//! let staged = desk.stage(&TransferRequest::new("Savings", "Rent", 50.0), Some(&actor))?;
//! ```

pub mod clock;
pub mod config;
pub mod desk;
pub mod rate_limit;
pub mod resolve;
pub mod throttle;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GuardConfig;
pub use desk::{DeskLimits, TransferDesk};
pub use rate_limit::MessageRateLimiter;
pub use throttle::{Throttle, ThrottledPlatform};
