//! End-to-end safeguard scenarios.
//!
//! Each module exposes `run(...)`, which returns what happened for tests to
//! inspect, and `run_scenario(...)`, which prints a walk-through for the demo.

pub mod account_resolution;
pub mod daily_limit;
pub mod direct_transfer;
pub mod expiry_and_ownership;
pub mod message_rate_limit;
pub mod staged_transfer;
