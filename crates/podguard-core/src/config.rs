//! Deployment configuration.
//!
//! Every section is optional in the TOML file; missing keys fall back to the
//! defaults below.
//!
//! ```toml
//! [safeguards]
//! max_transfer_cents = 1000000
//! max_daily_transfer_cents = 2500000
//! pending_transfer_ttl_secs = 300
//!
//! [storage]
//! data_dir = "/var/lib/podguard"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use serde::{Deserialize, Serialize};

use podguard_contracts::error::{GuardError, GuardResult};

use crate::desk::DeskLimits;
use crate::rate_limit::MessageRateLimiter;
use crate::throttle::Throttle;

/// Environment variable that overrides `storage.data_dir`.
pub const DATA_DIR_ENV: &str = "PODGUARD_DATA_DIR";

/// Upper bound on how long a staged transfer may wait for confirmation.
pub const MAX_PENDING_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub safeguards: SafeguardSettings,
    pub storage: StorageSettings,
    pub memory: MemorySettings,
    pub throttle: ThrottleSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeguardSettings {
    pub max_transfer_cents: i64,
    pub max_daily_transfer_cents: i64,
    pub pending_transfer_ttl_secs: u64,
    pub max_note_chars: usize,
}

impl Default for SafeguardSettings {
    fn default() -> Self {
        Self {
            max_transfer_cents: 1_000_000,
            max_daily_transfer_cents: 2_500_000,
            pending_transfer_ttl_secs: 300,
            max_note_chars: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    pub daily_limits_file: String,
    pub audit_file: String,
    pub memory_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            daily_limits_file: ".daily_limits.json".to_string(),
            audit_file: ".audit.jsonl".to_string(),
            memory_file: ".memories.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub max_facts: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self { max_facts: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleSettings {
    pub min_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self { min_delay_ms: 1_500, max_jitter_ms: 2_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_messages: usize,
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { max_messages: 10, window_secs: 60 }
    }
}

impl GuardConfig {
    /// Parse TOML configuration.
    ///
    /// Returns `GuardError::ConfigError` if the TOML is malformed or a key has
    /// the wrong type.
    pub fn from_toml_str(s: &str) -> GuardResult<Self> {
        toml::from_str(s).map_err(|e| GuardError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })
    }

    pub fn from_file(path: &Path) -> GuardResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GuardError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            self.storage.data_dir = PathBuf::from(dir);
        }
    }

    /// Reject settings that would disable a safeguard outright.
    pub fn validate(&self) -> GuardResult<()> {
        let s = &self.safeguards;
        let problem = if s.max_transfer_cents <= 0 {
            Some("safeguards.max_transfer_cents must be positive")
        } else if s.max_daily_transfer_cents <= 0 {
            Some("safeguards.max_daily_transfer_cents must be positive")
        } else if s.pending_transfer_ttl_secs == 0 {
            Some("safeguards.pending_transfer_ttl_secs must be positive")
        } else if s.pending_transfer_ttl_secs > MAX_PENDING_TTL_SECS {
            Some("safeguards.pending_transfer_ttl_secs must be at most one day")
        } else if self.rate_limit.window_secs == 0 {
            Some("rate_limit.window_secs must be positive")
        } else if self.rate_limit.max_messages == 0 {
            Some("rate_limit.max_messages must be positive")
        } else {
            None
        };
        match problem {
            Some(reason) => Err(GuardError::ConfigError { reason: reason.to_string() }),
            None => Ok(()),
        }
    }

    pub fn daily_limits_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.daily_limits_file)
    }

    pub fn audit_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.audit_file)
    }

    pub fn memory_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.memory_file)
    }

    pub fn desk_limits(&self) -> DeskLimits {
        DeskLimits {
            max_transfer_cents: self.safeguards.max_transfer_cents,
            pending_ttl: chrono::Duration::seconds(
                self.safeguards.pending_transfer_ttl_secs.min(MAX_PENDING_TTL_SECS) as i64,
            ),
            max_note_chars: self.safeguards.max_note_chars,
        }
    }

    pub fn throttle(&self) -> Throttle {
        Throttle::new(
            StdDuration::from_millis(self.throttle.min_delay_ms),
            StdDuration::from_millis(self.throttle.max_jitter_ms),
        )
    }

    pub fn rate_limiter(&self) -> MessageRateLimiter {
        MessageRateLimiter::new(
            self.rate_limit.max_messages,
            StdDuration::from_secs(self.rate_limit.window_secs),
        )
    }
}
