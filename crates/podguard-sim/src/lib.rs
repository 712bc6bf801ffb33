//! # podguard-sim
//!
//! Reference runtime for the podguard transfer safeguards.
//!
//! Wires the real components (desk, daily limit tracker, JSONL audit log,
//! tool dispatcher, fact store) around `MockPlatform`, an in-memory
//! platform whose balances actually move, and walks through the safeguard
//! behaviors end to end:
//!
//! 1. **Staged transfer**: an agent stages, a human confirms, spend is
//!    recorded and audited.
//! 2. **Daily limit**: cumulative spend is capped per actor and per day,
//!    including files left by older deployments.
//! 3. **Account resolution**: exact names win, substrings must be unique.
//! 4. **Expiry and ownership**: stale and foreign transfers cannot be acted on.
//! 5. **Direct transfer**: the one-shot path, with platform rejections and
//!    upstream failures.
//! 6. **Message rate limit**: a flood of agent turns is cut off.
//!
//! All data is fictional. No external calls are made.

pub mod mock_platform;
pub mod runtime;
pub mod scenarios;

use std::path::Path;

use chrono::{DateTime, Utc};

use podguard_contracts::error::{GuardError, GuardResult};
use podguard_core::GuardConfig;

pub use mock_platform::{sample_accounts, MockPlatform};
pub use runtime::{Runtime, Turn};

/// Default configuration with every state file under `data_dir`.
pub fn config_for(data_dir: &Path) -> GuardConfig {
    let mut config = GuardConfig::default();
    config.storage.data_dir = data_dir.to_path_buf();
    config
}

/// Parse a fixed RFC 3339 instant for scenarios that pin the clock.
pub fn fixed_instant(rfc3339: &str) -> GuardResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| GuardError::ConfigError { reason: format!("invalid instant '{}': {}", rfc3339, e) })
}
