//! # podguard-limits
//!
//! The daily cumulative transfer limit, persisted as one JSON file.
//!
//! `DailyLimitTracker` implements `podguard_core::traits::SpendLedger` and is
//! handed to the `TransferDesk`. `check` is a pure read; `record` appends one
//! entry under today's date and rewrites the file before returning.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use podguard_limits::DailyLimitTracker;
//!
//! let tracker = DailyLimitTracker::open(config.daily_limits_path(), 2_500_000)?;
//! let desk = TransferDesk::new(platform, limits).with_ledger(Box::new(tracker));
//! ```

pub mod tracker;

pub use tracker::{DailyLimitTracker, DayRecordFile};

// ── Tests ─────────────────────────────────────────────────────────────────────
