//! # podguard-contracts
//!
//! Shared types, records, and error contracts for the podguard transfer
//! safeguards.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, money formatting, and error types.

pub mod account;
pub mod activity;
pub mod actor;
pub mod audit;
pub mod error;
pub mod spend;
pub mod transfer;
